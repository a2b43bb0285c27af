//! Unified error types for the Beacon core.
//!
//! This module provides the standardized error types used across core
//! components. Framework-level errors (like `PluginError`) are defined in
//! beacon-framework.

use thiserror::Error;

// =============================================================================
// Resolution Errors
// =============================================================================

/// Errors raised by the service container during resolution.
///
/// Resolution errors propagate synchronously to whichever caller invoked
/// resolution and are never retried.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The requested service has no binding, no cached instance, and no
    /// usable constructor path.
    #[error("service `{0}` is not instantiable: no binding or constructor registered")]
    NotInstantiable(&'static str),

    /// A dependency of the requested service could not be resolved.
    #[error("cannot resolve dependency `{dependency}` required by `{requester}`")]
    UnresolvableDependency {
        /// The service whose construction demanded the dependency.
        requester: &'static str,
        /// The dependency that could not be produced.
        dependency: &'static str,
    },

    /// A binding cycle was detected on the resolution stack.
    #[error("circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency {
        /// The resolution path, ending with the service that closed the cycle.
        cycle: Vec<&'static str>,
    },

    /// A factory or constructor ran but failed to produce the service.
    #[error("failed to construct `{service}`: {reason}")]
    Construction {
        /// The service being constructed.
        service: &'static str,
        /// Why construction failed.
        reason: String,
    },
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for calls against the remote messaging platform API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The HTTP request itself failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The platform answered with `ok = false`.
    #[error("API error ({code}): {description}")]
    Api {
        /// Platform-reported error code.
        code: i64,
        /// Platform-reported description.
        description: String,
    },

    /// Failed to serialize a request or deserialize a response.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid client configuration (e.g. an empty bot token).
    #[error("invalid API client configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Error type for the persistence boundary.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The backing store rejected or failed the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be serialized or deserialized.
    #[error("storage serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for container resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result type for messaging API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
