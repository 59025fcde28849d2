//! Service configuration.
//!
//! Settings come from a TOML file (every key optional) and can then be
//! overridden from the environment, with `.env` loaded first:
//!
//! ```toml
//! max_history = 200
//! alert_magnitude = 4.0
//! forecast_hours = 24
//! cluster_window_minutes = 1440
//! cluster_radius_km = 100.0
//! feed_stale_minutes = 5
//! log_level = "INFO"
//! log_file = "quakemon.log"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::logging::LogLevel;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// History capacity of the event store.
    pub max_history: usize,
    /// Events at or above this magnitude are logged as significant.
    pub alert_magnitude: f64,
    /// Window of the forecast broadcast after every accepted event.
    pub forecast_hours: u32,
    /// Detection window used for foreshock alerts on ingest.
    pub cluster_window_minutes: u64,
    /// Linking radius used for foreshock alerts on ingest.
    pub cluster_radius_km: f64,
    /// Minutes without a feed update before the feed counts as stale.
    pub feed_stale_minutes: u64,
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_history: 200,
            alert_magnitude: 4.0,
            forecast_hours: 24,
            cluster_window_minutes: 1440,
            cluster_radius_km: 100.0,
            feed_stale_minutes: 5,
            log_level: "INFO".to_string(),
            log_file: None,
        }
    }
}

impl MonitorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QUAKEMON_*` overrides from the process environment, loading
    /// `.env` first if one exists.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        dotenv::dotenv().ok();
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unset keys are left
    /// alone; values that fail to parse are an error.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("QUAKEMON_MAX_HISTORY") {
            self.max_history = parse_override("QUAKEMON_MAX_HISTORY", &value)?;
        }
        if let Some(value) = lookup("QUAKEMON_ALERT_MAGNITUDE") {
            self.alert_magnitude = parse_override("QUAKEMON_ALERT_MAGNITUDE", &value)?;
        }
        if let Some(value) = lookup("QUAKEMON_FORECAST_HOURS") {
            self.forecast_hours = parse_override("QUAKEMON_FORECAST_HOURS", &value)?;
        }
        if let Some(value) = lookup("QUAKEMON_LOG_LEVEL") {
            self.log_level = value;
        }
        if let Some(value) = lookup("QUAKEMON_LOG_FILE") {
            self.log_file = Some(value).filter(|path| !path.is_empty());
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history == 0 {
            return Err(ConfigError::Invalid("max_history must be at least 1".into()));
        }
        if self.forecast_hours == 0 {
            return Err(ConfigError::Invalid("forecast_hours must be at least 1".into()));
        }
        if self.cluster_radius_km.is_nan() || self.cluster_radius_km <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "cluster_radius_km must be positive, got {}",
                self.cluster_radius_km
            )));
        }
        Ok(())
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level)
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} has unparseable value '{}'", key, value)))
}

/// Load and validate a TOML config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<MonitorConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    MonitorConfig::from_toml_str(&text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
