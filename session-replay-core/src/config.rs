//! Configuration types for the session replay pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "session-replay.toml";

/// Main configuration for session replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReplayConfig {
    /// Whether capture is enabled at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Recorded data queue configuration
    #[serde(default)]
    pub queue: QueueConfig,
}

fn default_enabled() -> bool {
    true
}

impl Default for SessionReplayConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            queue: QueueConfig::default(),
        }
    }
}

/// Recorded data queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Items older than this (measured from creation) are dropped
    #[serde(with = "humantime_serde", default = "default_max_delay")]
    pub max_delay: Duration,

    /// Interval of the periodic drain tick
    #[serde(with = "humantime_serde", default = "default_drain_interval")]
    pub drain_interval: Duration,

    /// Percentage (0-100) of drop events reported to telemetry
    #[serde(default = "default_telemetry_sample_rate")]
    pub telemetry_sample_rate: u32,
}

fn default_max_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_drain_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_telemetry_sample_rate() -> u32 {
    100
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_delay: default_max_delay(),
            drain_interval: default_drain_interval(),
            telemetry_sample_rate: default_telemetry_sample_rate(),
        }
    }
}

impl QueueConfig {
    /// Maximum item age in nanoseconds, as compared against device time
    pub fn max_delay_ns(&self) -> u64 {
        u64::try_from(self.max_delay.as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Builder for SessionReplayConfig
pub struct ConfigBuilder {
    config: SessionReplayConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: SessionReplayConfig::default(),
        }
    }

    /// Enable or disable capture
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Set queue configuration
    pub fn queue(mut self, config: QueueConfig) -> Self {
        self.config.queue = config;
        self
    }

    /// Set the item expiry delay
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.config.queue.max_delay = max_delay;
        self
    }

    /// Set the periodic drain interval
    pub fn drain_interval(mut self, interval: Duration) -> Self {
        self.config.queue.drain_interval = interval;
        self
    }

    /// Set the telemetry sample rate (clamped to 100)
    pub fn telemetry_sample_rate(mut self, rate: u32) -> Self {
        self.config.queue.telemetry_sample_rate = rate.min(100);
        self
    }

    /// Build the configuration
    pub fn build(self) -> SessionReplayConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionReplayConfig {
    /// Create a configuration builder starting from defaults
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. `session-replay.toml` in the working directory
    /// 3. File named by `SESSION_REPLAY_CONFIG_PATH`
    /// 4. `SESSION_REPLAY_*` environment variables, nested with `__`
    ///    (e.g. `SESSION_REPLAY_QUEUE__MAX_DELAY=2s`)
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source is invalid or the merged
    /// values fail validation.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_with(None)
    }

    /// Same layering as [`load`](Self::load), with `config_file` taking the
    /// place of `SESSION_REPLAY_CONFIG_PATH` when given. Environment
    /// variables still override the file.
    ///
    /// # Errors
    ///
    /// Returns an error if `config_file` does not exist, a source is invalid,
    /// or the merged values fail validation.
    pub fn load_with(config_file: Option<&std::path::Path>) -> crate::error::Result<Self> {
        use crate::error::SessionReplayError;
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(SessionReplayConfig::default()))
            .merge(Toml::file(DEFAULT_CONFIG_FILE));

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(SessionReplayError::Configuration(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Ok(path) = std::env::var("SESSION_REPLAY_CONFIG_PATH") {
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        figment = figment.merge(
            Env::prefixed("SESSION_REPLAY_")
                .ignore(&["CONFIG_PATH"])
                .split("__"),
        );

        let config: SessionReplayConfig = figment.extract().map_err(|e| {
            SessionReplayError::Configuration(format!("Failed to load configuration: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let config: SessionReplayConfig =
            Figment::from(Serialized::defaults(SessionReplayConfig::default()))
                .merge(Toml::file(path.as_ref()))
                .extract()
                .map_err(|e| {
                    crate::error::SessionReplayError::Configuration(format!(
                        "Failed to load configuration file: {}",
                        e
                    ))
                })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a duration is zero or the sample rate exceeds 100.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SessionReplayError;

        if self.queue.max_delay.is_zero() {
            return Err(SessionReplayError::Configuration(
                "queue.max_delay must be greater than zero".to_string(),
            ));
        }
        if self.queue.drain_interval.is_zero() {
            return Err(SessionReplayError::Configuration(
                "queue.drain_interval must be greater than zero".to_string(),
            ));
        }
        if self.queue.telemetry_sample_rate > 100 {
            return Err(SessionReplayError::Configuration(format!(
                "queue.telemetry_sample_rate must be within 0-100, got {}",
                self.queue.telemetry_sample_rate
            )));
        }
        Ok(())
    }
}
