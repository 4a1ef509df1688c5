//! Configuration management for the payment countdown
//!
//! Handles environment variables and countdown settings.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use strum::{Display, EnumString};
use tracing::info;

/// Session length the payment page uses (15 minutes)
pub const DEFAULT_DURATION_SECONDS: u64 = 900;

/// Nominal wake-up period
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

const MAX_TICK_INTERVAL_MS: u64 = 60_000;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Countdown length in seconds
    pub duration_seconds: u64,

    /// Milliseconds between wake-ups
    pub tick_interval_ms: u64,

    /// Log level
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Message shown when the countdown expires
    pub expired_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_seconds: DEFAULT_DURATION_SECONDS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            expired_message: "Time expired".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(duration) = lookup("PAYFORM_COUNTDOWN_DURATION") {
            config.duration_seconds = duration
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidDuration(duration))?;
        }

        if let Some(tick) = lookup("PAYFORM_COUNTDOWN_TICK_MS") {
            config.tick_interval_ms = tick
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTickInterval(tick))?;
        }

        if let Some(log_level) = lookup("PAYFORM_COUNTDOWN_LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Some(log_format) = lookup("PAYFORM_COUNTDOWN_LOG_FORMAT") {
            config.log_format = log_format
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidLogFormat(log_format))?;
        }

        if let Some(message) = lookup("PAYFORM_COUNTDOWN_EXPIRED_MESSAGE") {
            config.expired_message = message;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 || self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(ConfigError::InvalidTickInterval(
                self.tick_interval_ms.to_string(),
            ));
        }

        if self.log_level.trim().is_empty() {
            return Err(ConfigError::EmptyLogLevel);
        }

        Ok(())
    }

    /// Wake-up period as a `Duration`
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Log configuration
    pub fn log_config(&self) {
        info!("Configuration loaded:");
        info!("  Duration: {}s", self.duration_seconds);
        info!("  Tick interval: {}ms", self.tick_interval_ms);
        info!("  Log level: {}", self.log_level);
        info!("  Log format: {}", self.log_format);
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid countdown duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid tick interval (must be 1-60000 ms): {0}")]
    InvalidTickInterval(String),

    #[error("Invalid log format (expected compact or json): {0}")]
    InvalidLogFormat(String),

    #[error("Empty log level")]
    EmptyLogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.duration_seconds, 900);
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        config.tick_interval_ms = 60_001;
        assert!(config.validate().is_err());

        config.tick_interval_ms = 250;
        assert!(config.validate().is_ok());

        config.log_level = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyLogLevel)));
    }

    #[test]
    fn test_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PAYFORM_COUNTDOWN_DURATION", "120"),
            ("PAYFORM_COUNTDOWN_TICK_MS", "500"),
            ("PAYFORM_COUNTDOWN_LOG_FORMAT", "json"),
            ("PAYFORM_COUNTDOWN_EXPIRED_MESSAGE", "Süre doldu"),
        ]))
        .unwrap();

        assert_eq!(config.duration_seconds, 120);
        assert_eq!(config.tick_interval_ms, 500);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.expired_message, "Süre doldu");
    }

    #[test]
    fn test_zero_duration_is_accepted() {
        let config =
            Config::from_lookup(lookup_from(&[("PAYFORM_COUNTDOWN_DURATION", "0")])).unwrap();
        assert_eq!(config.duration_seconds, 0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("PAYFORM_COUNTDOWN_DURATION", "-5")])),
            Err(ConfigError::InvalidDuration(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("PAYFORM_COUNTDOWN_TICK_MS", "0")])),
            Err(ConfigError::InvalidTickInterval(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("PAYFORM_COUNTDOWN_LOG_FORMAT", "xml")])),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_empty_lookup_gives_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.duration_seconds, DEFAULT_DURATION_SECONDS);
        assert_eq!(config.expired_message, "Time expired");
    }
}
