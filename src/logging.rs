//! Tracing setup for the CLI and for embedders.
//!
//! Events go to stderr so CSV on stdout stays clean. `RUST_LOG` overrides the configured
//! level.
//!
//! # Example
//! ```no_run
//! use percept_daq::{config::AppConfig, logging};
//! use tracing::info;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! logging::init_from_config(&config)?;
//! info!("Application started");
//! # Ok(())
//! # }
//! ```

use crate::config::AppConfig;
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Output format for tracing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Multi-line, colored
    #[default]
    Pretty,
    /// One line per event, no colors
    Compact,
    /// Newline-delimited JSON
    Json,
}

/// Resolved subscriber settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TracingConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: Level,
    /// Output format
    pub format: OutputFormat,
    /// Whether to include file and line numbers
    pub with_file_and_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: OutputFormat::Pretty,
            with_file_and_line: true,
        }
    }
}

impl TracingConfig {
    /// Create tracing config from application configuration
    pub fn from_app_config(config: &AppConfig) -> Result<Self, String> {
        Ok(Self {
            level: parse_log_level(&config.application.log_level)?,
            format: config.application.log_format,
            ..Default::default()
        })
    }
}

/// Initialize tracing from application configuration
pub fn init_from_config(config: &AppConfig) -> Result<(), String> {
    init(TracingConfig::from_app_config(config)?)
}

/// Installs the global subscriber.
///
/// Idempotent: if a subscriber is already set, returns `Ok(())`.
pub fn init(config: TracingConfig) -> Result<(), String> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.level).into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.with_file_and_line)
        .with_line_number(config.with_file_and_line);
    let fmt_layer = match config.format {
        OutputFormat::Pretty => fmt_layer.pretty().boxed(),
        OutputFormat::Compact => fmt_layer.compact().with_ansi(false).boxed(),
        OutputFormat::Json => fmt_layer.json().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| format!("Failed to initialize tracing: {}", e))
}

fn parse_log_level(level: &str) -> Result<Level, String> {
    level.parse::<Level>().map_err(|_| {
        format!(
            "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
            level
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("trace"), Ok(Level::TRACE));
        assert_eq!(parse_log_level("warn"), Ok(Level::WARN));
        assert_eq!(parse_log_level("Debug"), Ok(Level::DEBUG));
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn test_tracing_config_from_app_config() {
        let mut config = AppConfig::default();
        config.application.log_level = "debug".to_string();
        config.application.log_format = OutputFormat::Json;

        let tracing_config = TracingConfig::from_app_config(&config).unwrap();
        assert_eq!(tracing_config.level, Level::DEBUG);
        assert_eq!(tracing_config.format, OutputFormat::Json);
        assert!(tracing_config.with_file_and_line);
    }

    // `test_init_is_idempotent` lives in tests/logging_init_test.rs: it installs
    // the process-global subscriber, which conflicts with `#[traced_test]` here.
}
