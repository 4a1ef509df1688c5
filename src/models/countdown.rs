//! Countdown Model
//!
//! Wall-clock countdown with one-shot threshold notifications at one third
//! and two thirds of the configured duration.
//!
//! Remaining time is always derived from the clock, never decremented, so a
//! late or jittery wake-up cannot make the countdown drift. The model is a
//! plain state machine: something else has to call [`Countdown::tick`]
//! periodically while it is running (see `services::countdown_service`).

use crate::error::CountdownResult;
use crate::models::display::{format_mm_ss, Urgency};
use crate::services::time_provider::TimeProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use strum::{Display, EnumString};
use uuid::Uuid;

/// Callback receiving the remaining seconds
pub type RemainingCallback = Box<dyn FnMut(u64) + Send>;

/// Callback fired once when the countdown reaches zero
pub type CompletedCallback = Box<dyn FnMut() + Send>;

/// Countdown lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CountdownState {
    Idle,
    Running,
    Paused,
    /// Reached zero on its own; only `reset` leaves this state
    Completed,
}

/// Fractional progress thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Threshold {
    OneThird,
    TwoThirds,
}

/// Optional observers invoked from [`Countdown::tick`]
#[derive(Default)]
pub struct CountdownCallbacks {
    pub on_tick: Option<RemainingCallback>,
    pub on_one_third_elapsed: Option<RemainingCallback>,
    pub on_two_thirds_elapsed: Option<RemainingCallback>,
    pub on_completed: Option<CompletedCallback>,
}

impl fmt::Debug for CountdownCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownCallbacks")
            .field("on_tick", &self.on_tick.is_some())
            .field("on_one_third_elapsed", &self.on_one_third_elapsed.is_some())
            .field("on_two_thirds_elapsed", &self.on_two_thirds_elapsed.is_some())
            .field("on_completed", &self.on_completed.is_some())
            .finish()
    }
}

/// Construction parameters for a [`Countdown`]
#[derive(Debug, Default)]
pub struct CountdownConfig {
    /// Total length in seconds; zero completes on the first tick
    pub duration_seconds: u64,
    pub callbacks: CountdownCallbacks,
}

impl CountdownConfig {
    pub fn new(duration_seconds: u64) -> Self {
        Self {
            duration_seconds,
            callbacks: CountdownCallbacks::default(),
        }
    }

    #[must_use]
    pub fn on_tick(mut self, callback: impl FnMut(u64) + Send + 'static) -> Self {
        self.callbacks.on_tick = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_one_third_elapsed(mut self, callback: impl FnMut(u64) + Send + 'static) -> Self {
        self.callbacks.on_one_third_elapsed = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_two_thirds_elapsed(mut self, callback: impl FnMut(u64) + Send + 'static) -> Self {
        self.callbacks.on_two_thirds_elapsed = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_completed(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.callbacks.on_completed = Some(Box::new(callback));
        self
    }
}

/// What a single tick observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub elapsed_seconds: u64,
    pub remaining_seconds: u64,
    /// Threshold whose callback fired on this tick, if any
    pub threshold: Option<Threshold>,
    pub completed: bool,
}

/// Serializable view of a countdown for display layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    pub id: Uuid,
    pub state: CountdownState,
    pub duration_seconds: u64,
    pub remaining_seconds: u64,
    pub formatted: String,
    pub urgency: Urgency,
    pub one_third_fired: bool,
    pub two_thirds_fired: bool,
}

impl CountdownSnapshot {
    /// Encode as a single JSON line
    pub fn to_json(&self) -> CountdownResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Restartable countdown driven by an injected clock
pub struct Countdown {
    id: Uuid,
    duration_seconds: u64,
    remaining_seconds: u64,
    state: CountdownState,

    /// Wall-clock start of the current run, shifted back by the seconds
    /// already counted before the last pause
    start_epoch_millis: Option<i64>,

    /// Elapsed seconds captured at the last pause
    accumulated_paused_seconds: u64,

    one_third_fired: bool,
    two_thirds_fired: bool,
    callbacks: CountdownCallbacks,
    clock: Arc<dyn TimeProvider>,
}

impl fmt::Debug for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Countdown")
            .field("id", &self.id)
            .field("duration_seconds", &self.duration_seconds)
            .field("remaining_seconds", &self.remaining_seconds)
            .field("state", &self.state)
            .field("start_epoch_millis", &self.start_epoch_millis)
            .field("accumulated_paused_seconds", &self.accumulated_paused_seconds)
            .field("one_third_fired", &self.one_third_fired)
            .field("two_thirds_fired", &self.two_thirds_fired)
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

impl Countdown {
    /// Create an idle countdown reading time from `clock`
    pub fn new(config: CountdownConfig, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            id: Uuid::new_v4(),
            duration_seconds: config.duration_seconds,
            remaining_seconds: config.duration_seconds,
            state: CountdownState::Idle,
            start_epoch_millis: None,
            accumulated_paused_seconds: 0,
            one_third_fired: false,
            two_thirds_fired: false,
            callbacks: config.callbacks,
            clock,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    /// Remaining seconds as of the last tick (or reset)
    pub fn remaining(&self) -> u64 {
        self.remaining_seconds
    }

    /// Remaining time as `MM:SS`
    pub fn formatted_remaining(&self) -> String {
        format_mm_ss(self.remaining_seconds)
    }

    pub fn one_third_fired(&self) -> bool {
        self.one_third_fired
    }

    pub fn two_thirds_fired(&self) -> bool {
        self.two_thirds_fired
    }

    /// Seconds counted so far in this run, including time before any pause
    pub fn elapsed_seconds(&self) -> u64 {
        match self.start_epoch_millis {
            Some(start) => self.elapsed_since(start),
            None => self.accumulated_paused_seconds,
        }
    }

    pub fn snapshot(&self) -> CountdownSnapshot {
        CountdownSnapshot {
            id: self.id,
            state: self.state,
            duration_seconds: self.duration_seconds,
            remaining_seconds: self.remaining_seconds,
            formatted: self.formatted_remaining(),
            urgency: Urgency::from_remaining(self.remaining_seconds, self.duration_seconds),
            one_third_fired: self.one_third_fired,
            two_thirds_fired: self.two_thirds_fired,
        }
    }

    /// Begin or continue counting.
    ///
    /// Returns `false` without changing anything when already running or
    /// when the countdown has completed and not been reset.
    pub fn start(&mut self) -> bool {
        match self.state {
            CountdownState::Running | CountdownState::Completed => false,
            CountdownState::Idle | CountdownState::Paused => {
                let carried_millis = i64::try_from(self.accumulated_paused_seconds)
                    .unwrap_or(i64::MAX)
                    .saturating_mul(1000);
                self.start_epoch_millis =
                    Some(self.clock.now_timestamp_millis().saturating_sub(carried_millis));
                self.state = CountdownState::Running;
                true
            }
        }
    }

    /// Stop counting and forget any paused progress. Threshold flags survive.
    pub fn stop(&mut self) {
        self.halt();
        if self.state != CountdownState::Completed {
            self.state = CountdownState::Idle;
        }
    }

    /// Freeze the elapsed count so a later `resume` continues from it.
    ///
    /// Returns `false` when not running.
    pub fn pause(&mut self) -> bool {
        if self.state != CountdownState::Running {
            return false;
        }

        self.accumulated_paused_seconds = self.elapsed_seconds();
        self.start_epoch_millis = None;
        self.state = CountdownState::Paused;
        true
    }

    /// Same as [`Countdown::start`]
    pub fn resume(&mut self) -> bool {
        self.start()
    }

    /// Return to `Idle` with fresh flags, optionally changing the duration.
    /// Does not start counting.
    pub fn reset(&mut self, new_duration_seconds: Option<u64>) {
        self.halt();
        self.state = CountdownState::Idle;
        if let Some(duration) = new_duration_seconds {
            self.duration_seconds = duration;
        }
        self.remaining_seconds = self.duration_seconds;
        self.one_third_fired = false;
        self.two_thirds_fired = false;
    }

    /// Re-read the clock and deliver notifications.
    ///
    /// Returns `None` when the countdown is not running. When both thresholds
    /// are crossed by the same tick only the two-thirds callback fires and the
    /// one-third callback is skipped for the rest of the run.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        let start = match (self.state, self.start_epoch_millis) {
            (CountdownState::Running, Some(start)) => start,
            _ => return None,
        };

        let elapsed = self.elapsed_since(start);
        let remaining = self.duration_seconds.saturating_sub(elapsed);
        self.remaining_seconds = remaining;

        let mut threshold = None;
        if self.duration_seconds > 0 {
            let scaled_elapsed = u128::from(elapsed) * 3;
            let duration = u128::from(self.duration_seconds);

            if !self.two_thirds_fired && scaled_elapsed >= duration * 2 {
                self.two_thirds_fired = true;
                threshold = Some(Threshold::TwoThirds);
                if let Some(callback) = self.callbacks.on_two_thirds_elapsed.as_mut() {
                    callback(remaining);
                }
            } else if !self.one_third_fired
                && !self.two_thirds_fired
                && scaled_elapsed >= duration
            {
                self.one_third_fired = true;
                threshold = Some(Threshold::OneThird);
                if let Some(callback) = self.callbacks.on_one_third_elapsed.as_mut() {
                    callback(remaining);
                }
            }
        }

        if let Some(callback) = self.callbacks.on_tick.as_mut() {
            callback(remaining);
        }

        let completed = remaining == 0;
        if completed {
            self.halt();
            self.state = CountdownState::Completed;
            if let Some(callback) = self.callbacks.on_completed.as_mut() {
                callback();
            }
        }

        Some(TickOutcome {
            elapsed_seconds: elapsed,
            remaining_seconds: remaining,
            threshold,
            completed,
        })
    }

    fn halt(&mut self) {
        self.start_epoch_millis = None;
        self.accumulated_paused_seconds = 0;
    }

    fn elapsed_since(&self, start_millis: i64) -> u64 {
        let delta = self.clock.now_timestamp_millis().saturating_sub(start_millis);
        u64::try_from(delta / 1000).unwrap_or(0)
    }
}
