//! # Beacon Runtime
//!
//! The deployment layer of the Beacon bot backend: configuration loading,
//! logging setup, the Telegram HTTP client, and the [`Bot`] bootstrap that
//! assembles a container, registers and boots plugins, and routes webhook
//! updates.
//!
//! # Example
//!
//! ```rust,ignore
//! use beacon_runtime::{Bot, ConfigLoader, logging};
//!
//! let config = ConfigLoader::new().load()?;
//! logging::init_from_config(&config.logging);
//!
//! let bot = Bot::builder()
//!     .config(config)
//!     .plugin(CorePlugin)
//!     .build()
//!     .await?;
//! bot.process_raw(&webhook_body).await?;
//! ```

pub mod bot;
pub mod config;
pub mod logging;
pub mod telegram;

pub use bot::{Bot, BotBuilder, RuntimeError, RuntimeResult};
pub use config::{
    BeaconConfig, ConfigError, ConfigLoader, ConfigResult, LogFormat, LogLevel, LoggingConfig,
    TelegramConfig,
};
pub use logging::{LoggingBuilder, init_from_config};
pub use telegram::Client;
