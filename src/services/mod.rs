//! Services module for the payment countdown
//!
//! Clock, periodic wake-up sources and the service tying them to a countdown.

pub mod countdown_service;
pub mod scheduler;
pub mod time_provider;

// Re-export commonly used services
pub use countdown_service::CountdownService;
pub use scheduler::{
    ManualScheduler, ScheduleHandle, ScheduledTask, TickScheduler, TokioScheduler,
};
pub use time_provider::{MockTimeProvider, SystemTimeProvider, TimeProvider};
