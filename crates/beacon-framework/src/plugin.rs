//! The plugin capability contract.
//!
//! A plugin is a self-contained feature module. Its lifecycle has two
//! phases, driven by the [`PluginRegistry`](crate::registry::PluginRegistry):
//!
//! 1. **register** — the plugin declares its own service bindings into the
//!    container. Binding is the only side effect allowed here; the container
//!    is still being assembled and other plugins may not be registered yet.
//! 2. **boot** — one-time initialization after *all* plugins are registered.
//!    The plugin may resolve services here; resolution errors propagate and
//!    abort the invocation.
//!
//! Event delivery is declared up front: [`subscriptions`](Plugin::subscriptions)
//! is read once at registration time and produces one listener per kind,
//! each invoking [`on_event`](Plugin::on_event). Within a plugin, listener
//! order equals declaration order.
//!
//! # Example
//!
//! ```rust,ignore
//! struct GreetPlugin;
//!
//! #[async_trait]
//! impl Plugin for GreetPlugin {
//!     fn name(&self) -> &'static str {
//!         "greet"
//!     }
//!
//!     fn subscriptions(&self) -> Vec<EventKind> {
//!         vec![EventKind::CommandReceived]
//!     }
//!
//!     async fn on_event(&self, event: Event, container: Arc<Container>) -> anyhow::Result<()> {
//!         if let Event::CommandReceived { command, message, .. } = &event
//!             && command.name == "hello"
//!         {
//!             let api = container.resolve::<dyn MessagingApi>()?;
//!             api.send_message(message.chat.id, "Hi!").await?;
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use beacon_core::{Container, Event, EventKind};

/// The capability contract every feature module implements.
///
/// Contract conformance and existence of the plugin type are enforced by the
/// compiler; the only lifecycle failure left at runtime is a failing `boot`,
/// which is startup-fatal.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// Stable display name used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Declares this plugin's service bindings.
    ///
    /// Must be side-effect-free beyond binding.
    fn register(&self, _container: &mut Container) {}

    /// One-time initialization after all plugins are registered.
    ///
    /// Runs at most once per invocation, in plugin-registration order.
    async fn boot(&self, _container: &Container) -> anyhow::Result<()> {
        Ok(())
    }

    /// The event kinds this plugin listens on, in declaration order.
    ///
    /// Consumed once at registration time.
    fn subscriptions(&self) -> Vec<EventKind>;

    /// Handles one dispatched event.
    ///
    /// An `Err` is logged by the dispatcher and suppressed; it never aborts
    /// sibling listeners or the routing pass.
    async fn on_event(&self, event: Event, container: Arc<Container>) -> anyhow::Result<()>;
}
