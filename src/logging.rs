//! Logging configuration for the payment countdown
//!
//! Structured logging setup plus the lifecycle events every countdown emits.

use crate::config::{Config, LogFormat};
use crate::models::countdown::{CountdownState, Threshold};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Registry,
};
use uuid::Uuid;

/// Initialize the application logging system.
///
/// `RUST_LOG` wins over the configured level. Fails if a global subscriber
/// is already installed.
pub fn init_logging(config: &Config) -> Result<(), TryInitError> {
    let default_filter = format!("payform_countdown={}", config.log_level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (json_layer, console_layer) = match config.log_format {
        LogFormat::Json => (
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogFormat::Compact => (
            None,
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            ),
        ),
    };

    Registry::default()
        .with(env_filter)
        .with(json_layer)
        .with(console_layer)
        .try_init()?;

    tracing::info!("Logging system initialized");
    Ok(())
}

/// Create a span for countdown operations.
///
/// `state` and `remaining` start empty and are recorded once the operation
/// has been applied.
#[macro_export]
macro_rules! countdown_span {
    ($level:expr, $operation:expr, $countdown_id:expr) => {
        tracing::span!(
            $level,
            "countdown_operation",
            operation = %$operation,
            countdown_id = %$countdown_id,
            state = tracing::field::Empty,
            remaining = tracing::field::Empty,
        )
    };
    ($operation:expr, $countdown_id:expr) => {
        $crate::countdown_span!(tracing::Level::INFO, $operation, $countdown_id)
    };
}

/// Log application startup
pub fn log_startup() {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        git_commit = option_env!("GIT_COMMIT").unwrap_or("unknown"),
        build_time = option_env!("BUILD_TIME").unwrap_or("unknown"),
        "Payment countdown starting up"
    );
}

/// Log countdown state change
pub fn log_countdown_state_change(
    countdown_id: Uuid,
    operation: &str,
    state: CountdownState,
    remaining: u64,
    duration: u64,
) {
    tracing::info!(
        countdown_id = %countdown_id,
        operation = %operation,
        state = %state,
        remaining = remaining,
        duration = duration,
        "Countdown state changed"
    );
}

/// Log a redundant call that was ignored
pub fn log_countdown_ignored(countdown_id: Uuid, operation: &str, state: CountdownState) {
    tracing::debug!(
        countdown_id = %countdown_id,
        operation = %operation,
        state = %state,
        "Countdown operation ignored"
    );
}

/// Log a single tick
pub fn log_countdown_tick(countdown_id: Uuid, elapsed: u64, remaining: u64) {
    tracing::trace!(
        countdown_id = %countdown_id,
        elapsed = elapsed,
        remaining = remaining,
        "Countdown tick"
    );
}

/// Log threshold crossing
pub fn log_threshold_crossed(countdown_id: Uuid, threshold: Threshold, remaining: u64) {
    tracing::info!(
        countdown_id = %countdown_id,
        threshold = %threshold,
        remaining = remaining,
        "Countdown threshold crossed"
    );
}

/// Log countdown expiry
pub fn log_countdown_completed(countdown_id: Uuid, duration: u64) {
    tracing::info!(
        countdown_id = %countdown_id,
        duration = duration,
        "Countdown completed"
    );
}

/// Log error with context
pub fn log_error(error: &str, context: &str, countdown_id: Option<Uuid>) {
    tracing::error!(
        error = %error,
        context = %context,
        countdown_id = ?countdown_id,
        "Application error occurred"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_initialization() {
        // A second install fails instead of panicking
        let config = Config::default();
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }

    #[test]
    fn test_json_logging_initialization() {
        let config = Config {
            log_format: LogFormat::Json,
            ..Config::default()
        };
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }

    #[test]
    fn test_log_helpers_without_subscriber() {
        let id = Uuid::new_v4();
        let span = countdown_span!("start", id);
        span.record("state", tracing::field::display(CountdownState::Running));
        let _tick_span = countdown_span!(tracing::Level::TRACE, "tick", id);
        log_startup();
        log_countdown_state_change(id, "start", CountdownState::Running, 10, 10);
        log_countdown_ignored(id, "pause", CountdownState::Idle);
        log_countdown_tick(id, 1, 9);
        log_threshold_crossed(id, Threshold::OneThird, 6);
        log_countdown_completed(id, 10);
        log_error("boom", "test", Some(id));
    }
}
