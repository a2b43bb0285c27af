//! # Beacon
//!
//! A plugin-driven, webhook-first Telegram bot backend for Rust.
//!
//! ## Overview
//!
//! Beacon is built for the webhook model: one inbound update, one fresh
//! container, one routing pass, nothing carried over. Features live in
//! plugins that declare typed event subscriptions; the router classifies
//! each update into an ordered event sequence and the registry dispatches
//! it with per-listener fault isolation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐    ┌──────────────┐    ┌────────────────┐    ┌───────────────────┐
//! │ Webhook │───▶│ UpdateRouter │───▶│ PluginRegistry │───▶│ Plugin "core"      │──▶ services
//! │  (Bot)  │    │ (classify)   │    │ (event bus)    │───▶│ Plugin "channel…"  │──▶ services
//! └─────────┘    └──────────────┘    └────────────────┘───▶│ Plugin ...         │──▶ services
//!                                                          └───────────────────┘
//! ```
//!
//! - **Bot**: loads configuration, assembles the container, boots plugins
//! - **UpdateRouter**: turns one update into `updateReceived`, one primary
//!   event, and zero or more secondary events
//! - **PluginRegistry**: ordered, fault-isolated listener dispatch
//! - **Container**: service bindings with compile-time auto-wiring
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use beacon::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!     beacon::runtime::logging::init_from_config(&config.logging);
//!
//!     let bot = Bot::builder()
//!         .config(config)
//!         .plugin(CorePlugin)
//!         .plugin(ChannelLogPlugin)
//!         .build()
//!         .await?;
//!
//!     bot.process_raw(&webhook_body).await?;
//!     Ok(())
//! }
//! ```

pub use beacon_core as core;
pub use beacon_framework as framework;
pub use beacon_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use beacon::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use beacon_runtime::{Bot, BotBuilder, ConfigLoader};

    // Plugin system - primary unit of event handling
    pub use beacon_framework::{Plugin, PluginRegistry, UpdateRouter};

    // Built-in plugins (requires "builtin" feature)
    #[cfg(feature = "builtin")]
    pub use beacon_framework::builtin::{ChannelLogPlugin, CorePlugin};

    // Event system - for writing listeners
    pub use beacon_core::{Command, Event, EventKind};

    // Container - service bindings and resolution
    pub use beacon_core::{Container, Inject, Injectable, Overrides};

    // Boundary ports - for interacting with the platform in listeners
    pub use beacon_core::{MessagingApi, Storage};

    // Update envelope types
    pub use beacon_core::{Chat, Message, Update, User};
}
