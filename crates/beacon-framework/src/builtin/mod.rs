//! Built-in plugins shipped with the framework.
//!
//! These cover the baseline behavior every deployment wants: the core
//! command surface and channel membership bookkeeping ([`CorePlugin`]),
//! and per-channel post statistics ([`ChannelLogPlugin`]). Both resolve
//! their collaborators through the container, so a deployment swaps the
//! messaging client or the storage backend without touching them.

mod channel_log;
mod core;

pub use channel_log::ChannelLogPlugin;
pub use core::CorePlugin;
