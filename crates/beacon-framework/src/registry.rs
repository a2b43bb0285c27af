//! Plugin lifecycle management and the event bus.
//!
//! [`PluginRegistry`] is the central owner of all registered plugins. It:
//!
//! - Accepts plugin instances keyed by their type; registering the same
//!   plugin type twice is a no-op, so no listeners are ever duplicated.
//! - Drives the two-phase lifecycle: `register` (plugin binds its own
//!   services) happens immediately, `boot` runs once for every plugin in
//!   registration order.
//! - Owns the **event bus**: an ordered listener list per [`EventKind`],
//!   populated from each plugin's declared subscriptions. Listener order is
//!   plugin-registration order, then within-plugin declaration order.
//! - Dispatches events with **fault isolation**: every listener invocation
//!   is wrapped individually. A failing listener is logged with the event
//!   kind and its owner's identity, and dispatch continues with the next
//!   listener — one broken handler never silences its siblings and never
//!   reaches the router.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut container = Container::new();
//! let mut registry = PluginRegistry::new();
//! registry.register(CorePlugin, &mut container);
//!
//! let container = Arc::new(container);
//! registry.boot(&container).await?;
//! registry.dispatch(&event, &container).await;
//! ```

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, error, info};

use beacon_core::{Container, Event, EventKind};

use crate::error::{PluginError, PluginResult};
use crate::plugin::Plugin;

/// A type-erased listener callback.
///
/// Events are cheap to clone (`Arc`-backed payloads), so every listener gets
/// its own copy plus the shared container for the invocation.
pub type ListenerFn =
    Arc<dyn Fn(Event, Arc<Container>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

struct ListenerEntry {
    /// Identity used when logging a listener failure.
    owner: Cow<'static, str>,
    callback: ListenerFn,
}

/// Central manager for plugin registration, lifecycle, and event dispatch.
#[derive(Default)]
pub struct PluginRegistry {
    /// Registration-ordered plugin list, keyed by the plugin's type.
    plugins: Vec<(TypeId, Arc<dyn Plugin>)>,
    listeners: HashMap<EventKind, Vec<ListenerEntry>>,
    booted: bool,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin.
    ///
    /// No-op if a plugin of the same type is already registered. Otherwise
    /// the plugin binds its services into `container` and one listener per
    /// declared subscription is appended to the bus.
    pub fn register<P: Plugin>(&mut self, plugin: P, container: &mut Container) {
        let id = TypeId::of::<P>();
        if self.plugins.iter().any(|(tid, _)| *tid == id) {
            debug!(plugin = plugin.name(), "plugin already registered, skipping");
            return;
        }

        plugin.register(container);

        let plugin: Arc<dyn Plugin> = Arc::new(plugin);
        let name = plugin.name();
        for kind in plugin.subscriptions() {
            let target = Arc::clone(&plugin);
            self.push_listener(
                kind,
                Cow::Borrowed(name),
                Arc::new(move |event, container| {
                    let target = Arc::clone(&target);
                    Box::pin(async move { target.on_event(event, container).await })
                }),
            );
        }
        self.plugins.push((id, plugin));
        info!(plugin = name, "plugin registered");
    }

    /// Appends a listener to the bus outside the plugin-registration path.
    pub fn add_listener(
        &mut self,
        kind: EventKind,
        owner: impl Into<Cow<'static, str>>,
        callback: ListenerFn,
    ) {
        self.push_listener(kind, owner.into(), callback);
    }

    fn push_listener(&mut self, kind: EventKind, owner: Cow<'static, str>, callback: ListenerFn) {
        self.listeners
            .entry(kind)
            .or_default()
            .push(ListenerEntry { owner, callback });
    }

    /// Boots every registered plugin, once, in registration order.
    ///
    /// Idempotent: later calls return immediately. The first boot failure
    /// aborts the invocation; no update may be routed afterwards.
    pub async fn boot(&mut self, container: &Container) -> PluginResult<()> {
        if self.booted {
            return Ok(());
        }
        for (_, plugin) in &self.plugins {
            plugin
                .boot(container)
                .await
                .map_err(|source| PluginError::Boot {
                    plugin: plugin.name(),
                    source,
                })?;
            debug!(plugin = plugin.name(), "plugin booted");
        }
        self.booted = true;
        Ok(())
    }

    /// Returns `true` once [`boot`](Self::boot) has completed successfully.
    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// Number of registered plugins.
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if a plugin of type `P` is registered.
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        let id = TypeId::of::<P>();
        self.plugins.iter().any(|(tid, _)| *tid == id)
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Dispatches one event to every listener for its kind, in order.
    ///
    /// An event with zero listeners is a silent no-op. Listener failures are
    /// logged and suppressed; this method cannot fail.
    pub async fn dispatch(&self, event: &Event, container: &Arc<Container>) {
        let Some(entries) = self.listeners.get(&event.kind()) else {
            return;
        };
        for entry in entries {
            if let Err(err) = (entry.callback)(event.clone(), Arc::clone(container)).await {
                error!(
                    event = %event.kind(),
                    listener = %entry.owner,
                    error = %err,
                    "listener failed, continuing with remaining listeners"
                );
            }
        }
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.len())
            .field("events", &self.listeners.len())
            .field("booted", &self.booted)
            .finish()
    }
}
