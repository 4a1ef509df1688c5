//! Session countdown for the payment form
//!
//! A restartable wall-clock countdown that reports the remaining time every
//! tick and fires one-shot notifications when one third and two thirds of
//! the duration have elapsed.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use config::{Config, ConfigError, LogFormat};
pub use error::{CountdownError, CountdownResult};
pub use models::{
    Countdown, CountdownConfig, CountdownSnapshot, CountdownState, Threshold, Urgency,
};
pub use services::{
    CountdownService, ManualScheduler, MockTimeProvider, SystemTimeProvider, TimeProvider,
    TokioScheduler,
};
