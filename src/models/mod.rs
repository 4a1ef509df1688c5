//! Models module for the payment countdown
//!
//! The countdown state machine and its display helpers.

pub mod countdown;
pub mod display;

// Re-export commonly used types
pub use countdown::{
    CompletedCallback, Countdown, CountdownCallbacks, CountdownConfig, CountdownSnapshot,
    CountdownState, RemainingCallback, Threshold, TickOutcome,
};
pub use display::{format_mm_ss, Urgency};
