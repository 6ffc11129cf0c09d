//! Configuration System using Figment
//!
//! Configuration is layered from:
//! 1. Built-in defaults
//! 2. A TOML file (`config/percept_daq.toml` unless another path is given)
//! 3. Environment variables prefixed with `PERCEPT_DAQ_`, nested keys split on `__`
//!
//! # Example
//! ```no_run
//! use percept_daq::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! config.validate()?;
//! println!("Application: {}", config.application.name);
//! # Ok::<(), percept_daq::error::DaqError>(())
//! ```

use crate::error::{AppResult, DaqError};
use crate::logging::OutputFormat;
use crate::packet::DeviceSettings;
use crate::timing::{SequencePolicy, StreamOptions, DEFAULT_RESYNC_THRESHOLD_SECS};
use crate::validation::{is_positive_finite, is_valid_path};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/percept_daq.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PERCEPT_DAQ_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Device settings used when the input does not carry its own
    #[serde(default)]
    pub device: DeviceSettings,
    /// Timestamping settings
    #[serde(default)]
    pub stream: StreamConfig,
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format
    #[serde(default)]
    pub log_format: OutputFormat,
}

/// What the CLI does when a single packet cannot be timestamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketErrorPolicy {
    /// Stop the stream at the first bad packet.
    #[default]
    Abort,
    /// Log the packet and keep going.
    Skip,
}

/// Timestamping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Coarse-clock drift that forces a re-sync, in seconds
    #[serde(default = "default_resync_threshold")]
    pub resync_threshold_secs: f64,
    /// Sequence contiguity policy
    #[serde(default)]
    pub sequence_policy: SequencePolicy,
    /// Packet-level error handling
    #[serde(default)]
    pub on_packet_error: PacketErrorPolicy,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output CSV path; stdout when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Whether to add an RFC 3339 UTC column
    #[serde(default = "default_include_utc")]
    pub include_utc: bool,
}

// Default value functions
fn default_name() -> String {
    "percept-daq".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_resync_threshold() -> f64 {
    DEFAULT_RESYNC_THRESHOLD_SECS
}

fn default_include_utc() -> bool {
    true
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: OutputFormat::default(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            resync_threshold_secs: default_resync_threshold(),
            sequence_policy: SequencePolicy::default(),
            on_packet_error: PacketErrorPolicy::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            include_utc: default_include_utc(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file and environment variables
    ///
    /// Environment variables override the file, e.g.
    /// `PERCEPT_DAQ_STREAM__SEQUENCE_POLICY=reject`.
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Ok(Self::figment(path.as_ref()).extract()?)
    }

    /// The layered provider stack, exposed for callers that merge extra sources.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(DaqError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        is_positive_finite(self.stream.resync_threshold_secs).map_err(|e| {
            DaqError::Configuration(format!(
                "Invalid resync_threshold_secs {}: {}",
                self.stream.resync_threshold_secs, e
            ))
        })?;

        self.device.validate()?;

        if let Some(path) = &self.output.path {
            is_valid_path(&path.to_string_lossy()).map_err(|e| {
                DaqError::Configuration(format!("Invalid output path: {}", e))
            })?;
        }

        Ok(())
    }

    /// Driver options derived from the `[stream]` section
    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions {
            resync_threshold_secs: self.stream.resync_threshold_secs,
            sequence_policy: self.stream.sequence_policy,
        }
    }
}
