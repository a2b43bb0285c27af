//! Logging setup over `tracing` and `tracing-subscriber`.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ConfigLoader::new().load()?;
//! logging::init_from_config(&config.logging);
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LoggingConfig};

/// Initializes logging from configuration.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// A builder for configuring the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured base level when set.
#[derive(Default)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    base_level: Option<String>,
    format: LogFormat,
}

impl LoggingBuilder {
    /// Creates a builder with compact output at `info`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from a [`LoggingConfig`].
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new();
        builder.base_level = Some(config.level.as_str().to_string());
        builder.format = config.format;
        for (module, level) in &config.filters {
            builder.directives.push(format!("{module}={level}"));
        }
        builder
    }

    /// Adds a filter directive, e.g. `beacon_framework=debug`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Sets the output format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn build_filter(&self) -> EnvFilter {
        let base = self.base_level.as_deref().unwrap_or("info");
        let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base));
        for directive in &self.directives {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
        filter
    }

    /// Initializes the logging system, ignoring a second initialization.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Tries to initialize the logging system.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();
        match self.format {
            LogFormat::Compact => tracing_subscriber::registry()
                .with(fmt::layer().compact())
                .with(filter)
                .try_init(),
            LogFormat::Full => tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(fmt::layer().pretty())
                .with(filter)
                .try_init(),
        }
    }
}
