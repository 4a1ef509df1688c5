//! Time Provider Trait and Implementations
//!
//! Wall-clock abstraction the countdown reads its elapsed time from.
//! Production code uses the system clock; tests drive a mock clock by hand.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Source of wall-clock time for countdowns
pub trait TimeProvider: Send + Sync {
    /// Get the current UTC time
    fn now_utc(&self) -> DateTime<Utc>;

    /// Get current Unix timestamp (seconds since epoch)
    fn now_timestamp(&self) -> i64 {
        self.now_utc().timestamp()
    }

    /// Get current Unix timestamp in milliseconds
    fn now_timestamp_millis(&self) -> i64 {
        self.now_utc().timestamp_millis()
    }
}

/// System time provider for production use
#[derive(Debug, Clone, Default)]
pub struct SystemTimeProvider;

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock time provider for testing
///
/// Clones share the same underlying clock, so a test can keep one handle
/// and give another to the countdown under test.
#[derive(Debug, Clone)]
pub struct MockTimeProvider {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockTimeProvider {
    /// Create a new mock time provider starting from the given time
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start_time)),
        }
    }

    /// Create a mock time provider starting from now
    pub fn new_from_now() -> Self {
        Self::new(Utc::now())
    }

    /// Create a mock time provider starting from a fixed date/time
    pub fn new_from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        min: u32,
        sec: u32,
    ) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self::new)
    }

    /// Set the current mock time
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        *self.current_time.lock().unwrap_or_else(PoisonError::into_inner) = new_time;
    }

    /// Advance the mock time by the specified duration
    pub fn advance(&self, duration: chrono::Duration) {
        let mut time = self.current_time.lock().unwrap_or_else(PoisonError::into_inner);
        *time += duration;
    }

    /// Advance the mock time by the specified number of seconds
    pub fn advance_seconds(&self, seconds: i64) {
        self.advance(chrono::Duration::seconds(seconds));
    }

    /// Advance the mock time by the specified number of milliseconds
    pub fn advance_millis(&self, millis: i64) {
        self.advance(chrono::Duration::milliseconds(millis));
    }

    /// Get the current mock time
    pub fn current_time(&self) -> DateTime<Utc> {
        *self.current_time.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockTimeProvider {
    fn default() -> Self {
        Self::new_from_now()
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_utc(&self) -> DateTime<Utc> {
        self.current_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_time_provider() {
        let provider = SystemTimeProvider::new();
        let now = provider.now_utc();

        // System time should be reasonable (within last minute)
        assert!((Utc::now() - now).num_seconds().abs() < 60);
        assert_eq!(provider.now_timestamp(), now.timestamp());
    }

    #[test]
    fn test_mock_time_provider() {
        let provider = MockTimeProvider::new_from_ymd_hms(2025, 1, 7, 10, 30, 0).unwrap();
        let start = provider.now_utc();

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 7, 10, 30, 0).unwrap());
        assert_eq!(provider.now_timestamp_millis(), start.timestamp_millis());
    }

    #[test]
    fn test_mock_time_advance_is_shared_between_clones() {
        let provider = MockTimeProvider::new_from_ymd_hms(2025, 1, 7, 10, 30, 0).unwrap();
        let handle = provider.clone();
        let start = provider.now_utc();

        handle.advance_seconds(90);
        assert_eq!(provider.now_utc(), start + chrono::Duration::seconds(90));

        handle.advance_millis(250);
        assert_eq!(
            provider.now_timestamp_millis() - start.timestamp_millis(),
            90_250
        );
    }

    #[test]
    fn test_mock_set_time() {
        let provider = MockTimeProvider::new_from_ymd_hms(2025, 1, 7, 10, 30, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap();

        provider.set_time(later);
        assert_eq!(provider.now_utc(), later);
    }
}
