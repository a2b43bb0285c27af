//! Framework-level error types.
//!
//! Core resolution errors live in `beacon_core::error`; this module covers
//! the plugin lifecycle, whose failures are startup-fatal: they abort the
//! invocation before any update is routed.

use thiserror::Error;

/// Errors raised while driving the plugin lifecycle.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A plugin's `boot` hook failed. Nothing is routed after this.
    #[error("plugin `{plugin}` failed to boot")]
    Boot {
        /// The failing plugin's name.
        plugin: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Result type for plugin lifecycle operations.
pub type PluginResult<T> = Result<T, PluginError>;
