//! Configuration loading and schema.
//!
//! Configuration is layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`beacon.toml` or `config.toml` in the working directory,
//!    or an explicit path)
//! 3. Environment variables with the `BEACON_` prefix and `__` as the
//!    section separator:
//!    - `BEACON_TELEGRAM__TOKEN=123:abc` → `telegram.token`
//!    - `BEACON_LOGGING__LEVEL=debug` → `logging.level`
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ConfigLoader::new().load()?;
//! logging::init_from_config(&config.logging);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Serialized};
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use beacon_core::injectable;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found at the specified path.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Extraction or parse failure from any source.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A value that parsed but cannot be used.
    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

impl ConfigError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
}

injectable!(opaque BeaconConfig);

impl BeaconConfig {
    /// Validates cross-field constraints after extraction.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.telegram.token.is_empty() {
            return Err(ConfigError::validation(
                "telegram.token is required (BEACON_TELEGRAM__TOKEN)",
            ));
        }
        if !self.telegram.api_base.starts_with("http") {
            return Err(ConfigError::validation(format!(
                "telegram.api_base is not a URL: {}",
                self.telegram.api_base
            )));
        }
        Ok(())
    }
}

/// Messaging platform connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by the platform. Required.
    pub token: String,
    /// API endpoint base, without a trailing slash.
    pub api_base: String,
    /// Public HTTPS URL the platform delivers updates to.
    pub webhook_url: Option<String>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: "https://api.telegram.org".to_string(),
            webhook_url: None,
            timeout_ms: 30_000,
        }
    }
}

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The filter directive string for this level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line output, good for webhook-invocation logs.
    #[default]
    Compact,
    /// The default tracing-subscriber layout.
    Full,
    /// Multi-line human-oriented output for development.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Extra per-module directives, e.g. `beacon_framework = "debug"`.
    pub filters: std::collections::BTreeMap<String, LogLevel>,
}

/// Layered configuration loader.
pub struct ConfigLoader {
    figment: Figment,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader with defaults and environment loading enabled.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: BeaconConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads, extracts, and validates the configuration.
    pub fn load(self) -> ConfigResult<BeaconConfig> {
        let figment = self.build_figment()?;
        let config: BeaconConfig = figment
            .extract()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;

        debug!(
            logging_level = %config.logging.level,
            api_base = %config.telegram.api_base,
            "configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(BeaconConfig::default()));
        figment = figment.merge(self.figment);

        if let Some(path) = self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = Self::search_config_files(figment);
        }

        if self.load_env {
            figment = figment.merge(Env::prefixed("BEACON_").split("__"));
        }
        Ok(figment)
    }

    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            _ => Err(ConfigError::Parse(format!(
                "unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    fn search_config_files(figment: Figment) -> Figment {
        #[cfg(feature = "toml-config")]
        {
            for name in ["beacon.toml", "config.toml"] {
                if Path::new(name).exists() {
                    info!(path = name, "loading configuration file");
                    return figment.merge(Toml::file(name));
                }
            }
        }
        warn!("no configuration file found, using defaults");
        figment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_token() -> BeaconConfig {
        BeaconConfig {
            telegram: TelegramConfig {
                token: "123:abc".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn defaults_need_a_token() {
        let err = ConfigLoader::new().without_env().load().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn programmatic_merge_passes_validation() {
        let config = ConfigLoader::new()
            .without_env()
            .merge(with_token())
            .load()
            .unwrap();
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.telegram.timeout_ms, 30_000);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn env_overrides_file_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "beacon.toml",
                r#"
                    [telegram]
                    token = "123:abc"

                    [logging]
                    level = "debug"
                "#,
            )?;
            jail.set_env("BEACON_LOGGING__LEVEL", "warn");
            jail.set_env("BEACON_TELEGRAM__TIMEOUT_MS", "5000");

            let config = ConfigLoader::new().load().expect("load");
            assert_eq!(config.logging.level, LogLevel::Warn);
            assert_eq!(config.telegram.timeout_ms, 5_000);
            assert_eq!(config.telegram.token, "123:abc");
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = ConfigLoader::new()
            .file("/nonexistent/beacon.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
