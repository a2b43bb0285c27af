//! # Beacon Framework
//!
//! The plugin layer of the Beacon bot backend.
//!
//! This crate turns the core building blocks into a running event pipeline:
//!
//! - [`Plugin`]: the capability contract feature modules implement.
//! - [`PluginRegistry`]: registration, the two-phase lifecycle, the event
//!   bus, and fault-isolated dispatch.
//! - [`UpdateRouter`]: classification of one inbound update into its
//!   ordered event sequence.
//! - [`builtin`] (feature `builtin`): the plugins every deployment starts
//!   from.
//!
//! The flow per webhook invocation:
//!
//! ```text
//! Update ──► UpdateRouter ──► [updateReceived, primary, secondary…]
//!                                    │
//!                                    ▼
//!                            PluginRegistry ──► plugin listeners
//! ```

#[cfg(feature = "builtin")]
pub mod builtin;
pub mod error;
pub mod plugin;
pub mod registry;
pub mod router;

pub use error::{PluginError, PluginResult};
pub use plugin::Plugin;
pub use registry::{ListenerFn, PluginRegistry};
pub use router::{UpdateRouter, classify};
