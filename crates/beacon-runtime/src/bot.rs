//! Bot assembly and the per-invocation entry point.
//!
//! [`BotBuilder`] wires the whole stack for one webhook invocation: load
//! configuration, bind the platform client and storage into a fresh
//! container, register plugins, boot them, and hand back a [`Bot`] that
//! routes updates. Nothing survives the invocation; the next webhook call
//! builds a new one.
//!
//! # Example
//!
//! ```rust,ignore
//! let bot = Bot::builder()
//!     .plugin(CorePlugin)
//!     .plugin(ChannelLogPlugin)
//!     .build()
//!     .await?;
//!
//! bot.process_raw(&body).await?;
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use beacon_core::{
    ApiError, Container, MemoryStorage, MessagingApi, ResolveError, Storage, Update,
};
use beacon_framework::{Plugin, PluginError, PluginRegistry, UpdateRouter};

use crate::config::{BeaconConfig, ConfigError, ConfigLoader};
use crate::telegram::Client;

/// Errors raised while assembling or driving the bot.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The webhook body was not a valid update envelope.
    #[error("malformed update payload: {0}")]
    MalformedUpdate(#[from] serde_json::Error),

    /// An operation needed a webhook URL and none was configured.
    #[error("telegram.webhook_url is not configured")]
    MissingWebhookUrl,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

type RegisterFn = Box<dyn FnOnce(&mut PluginRegistry, &mut Container) + Send>;

/// Assembles a [`Bot`] from configuration, bindings, and plugins.
pub struct BotBuilder {
    config: Option<BeaconConfig>,
    storage: Option<Arc<dyn Storage>>,
    api: Option<Arc<dyn MessagingApi>>,
    registrations: Vec<RegisterFn>,
}

impl Default for BotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BotBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            config: None,
            storage: None,
            api: None,
            registrations: Vec::new(),
        }
    }

    /// Uses `config` instead of loading from file and environment.
    pub fn config(mut self, config: BeaconConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Binds a storage backend. Defaults to [`MemoryStorage`].
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Binds a messaging client. Defaults to the HTTP [`Client`] built from
    /// configuration, constructed lazily on first resolution.
    pub fn api(mut self, api: Arc<dyn MessagingApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Adds a plugin. Registration order is boot and dispatch order.
    pub fn plugin<P: Plugin>(mut self, plugin: P) -> Self {
        self.registrations.push(Box::new(move |registry, container| {
            registry.register(plugin, container);
        }));
        self
    }

    /// Builds the container, registers and boots every plugin, and returns
    /// the routing bot.
    pub async fn build(self) -> RuntimeResult<Bot> {
        let config = match self.config {
            Some(config) => {
                config.validate()?;
                config
            }
            None => ConfigLoader::new().load()?,
        };
        let config = Arc::new(config);

        let mut container = Container::new();
        container.register_instance::<BeaconConfig>(Arc::clone(&config));

        match self.api {
            Some(api) => container.register_instance::<dyn MessagingApi>(api),
            None => container.singleton::<dyn MessagingApi, _>(|resolver| {
                resolver
                    .resolve::<Client>()
                    .map(|client| client as Arc<dyn MessagingApi>)
            }),
        }
        match self.storage {
            Some(storage) => container.register_instance::<dyn Storage>(storage),
            None => container.singleton::<dyn Storage, _>(|_| {
                Ok(Arc::new(MemoryStorage::new()) as Arc<dyn Storage>)
            }),
        }

        let mut registry = PluginRegistry::new();
        for register in self.registrations {
            register(&mut registry, &mut container);
        }

        let container = Arc::new(container);
        registry.boot(&container).await?;
        info!(plugins = registry.plugin_count(), "bot assembled");

        Ok(Bot {
            router: UpdateRouter::new(Arc::new(registry), container),
            config,
        })
    }
}

/// A fully assembled bot: booted plugins behind an update router.
pub struct Bot {
    router: UpdateRouter,
    config: Arc<BeaconConfig>,
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Bot {
    /// Starts assembling a bot.
    pub fn builder() -> BotBuilder {
        BotBuilder::new()
    }

    /// The effective configuration.
    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    /// The shared container.
    pub fn container(&self) -> &Arc<Container> {
        self.router.container()
    }

    /// Routes one parsed update.
    pub async fn process_update(&self, update: Update) {
        self.router.route(update).await;
    }

    /// Parses a raw webhook body and routes it.
    pub async fn process_raw(&self, body: &str) -> RuntimeResult<()> {
        let update: Update = serde_json::from_str(body)?;
        self.process_update(update).await;
        Ok(())
    }

    /// Registers the configured webhook URL with the platform.
    pub async fn set_webhook(&self) -> RuntimeResult<()> {
        let url = self
            .config
            .telegram
            .webhook_url
            .as_deref()
            .ok_or(RuntimeError::MissingWebhookUrl)?;
        self.client()?.set_webhook(url).await?;
        info!(url, "webhook registered");
        Ok(())
    }

    /// Removes the webhook registration.
    pub async fn delete_webhook(&self) -> RuntimeResult<()> {
        self.client()?.delete_webhook().await?;
        Ok(())
    }

    /// Fetches the platform's webhook status record.
    pub async fn webhook_info(&self) -> RuntimeResult<serde_json::Value> {
        Ok(self.client()?.get_webhook_info().await?)
    }

    /// Fetches the bot's own account record.
    pub async fn me(&self) -> RuntimeResult<serde_json::Value> {
        Ok(self.client()?.get_me().await?)
    }

    fn client(&self) -> RuntimeResult<Arc<Client>> {
        Ok(self.container().resolve::<Client>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use beacon_core::{ApiResult, Event, EventKind};
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    use crate::config::TelegramConfig;

    fn test_config() -> BeaconConfig {
        BeaconConfig {
            telegram: TelegramConfig {
                token: "123:abc".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct NullApi;

    #[async_trait]
    impl MessagingApi for NullApi {
        async fn call(&self, _method: &str, _params: Value) -> ApiResult<Value> {
            Ok(Value::Null)
        }
    }

    struct RecorderPlugin {
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Plugin for RecorderPlugin {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn subscriptions(&self) -> Vec<EventKind> {
            vec![
                EventKind::UpdateReceived,
                EventKind::MessageReceived,
                EventKind::TextReceived,
                EventKind::CommandReceived,
            ]
        }

        async fn on_event(&self, event: Event, _container: Arc<Container>) -> anyhow::Result<()> {
            self.seen.lock().push(event.kind());
            Ok(())
        }
    }

    #[tokio::test]
    async fn raw_webhook_body_flows_to_plugins() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let bot = Bot::builder()
            .config(test_config())
            .api(Arc::new(NullApi))
            .plugin(RecorderPlugin {
                seen: Arc::clone(&seen),
            })
            .build()
            .await
            .unwrap();

        let body = json!({
            "update_id": 1,
            "message": {
                "message_id": 2,
                "chat": { "id": 3, "type": "private" },
                "text": "/start"
            }
        })
        .to_string();
        bot.process_raw(&body).await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                EventKind::UpdateReceived,
                EventKind::MessageReceived,
                EventKind::TextReceived,
                EventKind::CommandReceived,
            ]
        );
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_before_routing() {
        let bot = Bot::builder()
            .config(test_config())
            .api(Arc::new(NullApi))
            .build()
            .await
            .unwrap();

        let err = bot.process_raw("{not json").await.unwrap_err();
        assert!(matches!(err, RuntimeError::MalformedUpdate(_)));
    }

    #[tokio::test]
    async fn build_validates_programmatic_config() {
        let err = Bot::builder()
            .config(BeaconConfig::default())
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[tokio::test]
    async fn webhook_registration_needs_a_url() {
        let bot = Bot::builder()
            .config(test_config())
            .build()
            .await
            .unwrap();
        let err = bot.set_webhook().await.unwrap_err();
        assert!(matches!(err, RuntimeError::MissingWebhookUrl));
    }

    #[tokio::test]
    async fn default_bindings_resolve() {
        let bot = Bot::builder()
            .config(test_config())
            .build()
            .await
            .unwrap();

        bot.container().resolve::<dyn Storage>().unwrap();
        bot.container().resolve::<dyn MessagingApi>().unwrap();
    }
}
