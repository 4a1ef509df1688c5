//! Error handling for the payment countdown
//!
//! Countdown operations themselves never fail; redundant transitions are
//! silent no-ops. Errors only come from configuration, from binding to a
//! host scheduler and from encoding snapshots.

use crate::config::ConfigError;
use thiserror::Error;

/// Crate-level error types
#[derive(Error, Debug)]
pub enum CountdownError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No scheduler available: {0}")]
    SchedulerUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CountdownError {
    /// Stable error code for structured logs
    pub fn error_code(&self) -> &'static str {
        match self {
            CountdownError::Config(_) => "ConfigError",
            CountdownError::SchedulerUnavailable(_) => "SchedulerUnavailable",
            CountdownError::Serialization(_) => "SerializationError",
        }
    }
}

/// Result type alias for countdown operations
pub type CountdownResult<T> = Result<T, CountdownError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CountdownError::SchedulerUnavailable("no runtime".to_string()).error_code(),
            "SchedulerUnavailable"
        );
        assert_eq!(
            CountdownError::Config(ConfigError::InvalidTickInterval("0".to_string())).error_code(),
            "ConfigError"
        );
    }

    #[test]
    fn test_serialization_error_conversion() {
        let source = serde_json::from_str::<u64>("not a number").unwrap_err();
        let error: CountdownError = source.into();
        assert_eq!(error.error_code(), "SerializationError");
    }

    #[test]
    fn test_config_error_conversion() {
        let error: CountdownError = ConfigError::InvalidDuration("abc".to_string()).into();
        assert!(matches!(error, CountdownError::Config(_)));
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid countdown duration: abc"
        );
    }
}
