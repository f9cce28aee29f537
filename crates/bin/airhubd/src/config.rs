//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `airhub.toml` in the working directory, or at the path in
//! `AIRHUB_CONFIG`. Every field except the purifier credentials has a
//! default, so the file is optional. Environment variables take precedence
//! over file values.

use std::time::Duration;

use serde::Deserialize;

use airhub_adapter_miot_purifier::PurifierConfig;

const DEFAULT_PATH: &str = "airhub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Polling settings.
    pub coordinator: CoordinatorConfig,
    /// One entry per air purifier.
    pub purifiers: Vec<PurifierConfig>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Update coordinator configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Seconds between two refreshes of every entity.
    pub scan_interval_secs: u64,
}

impl Config {
    /// Load configuration from `airhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("AIRHUB_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        let interval = std::env::var("AIRHUB_SCAN_INTERVAL").ok();
        if let Some(secs) = interval.and_then(|val| val.parse().ok()) {
            self.coordinator.scan_interval_secs = secs;
        }
        if let Ok(val) = std::env::var("AIRHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.coordinator.scan_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "scan_interval_secs must be non-zero".to_string(),
            ));
        }
        for (index, purifier) in self.purifiers.iter().enumerate() {
            purifier.validate().map_err(|err| {
                ConfigError::Validation(format!("purifiers[{index}] ({}): {err}", purifier.host))
            })?;
        }
        Ok(())
    }

    /// Interval between two polls of every entity.
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.coordinator.scan_interval_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "airhubd=info,airhub_app=info,airhub_adapter_miot_purifier=info".to_string(),
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 30,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
