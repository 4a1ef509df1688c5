//! Countdown Service
//!
//! Binds a [`Countdown`] to a periodic wake-up source and owns the
//! registration, so starting schedules ticks and stopping, pausing,
//! resetting or expiring cancels them.
//!
//! Cancellation is synchronous: once `stop`, `pause` or `reset` returns no
//! further callback fires. A wake-up already in flight finds the countdown
//! not running and does nothing.
//!
//! Callbacks run while the service lock is held and must not call back into
//! the same service.

use crate::config::DEFAULT_TICK_INTERVAL_MS;
use crate::countdown_span;
use crate::logging::{
    log_countdown_completed, log_countdown_ignored, log_countdown_state_change,
    log_countdown_tick, log_threshold_crossed,
};
use crate::models::countdown::{Countdown, CountdownConfig, CountdownSnapshot, CountdownState};
use crate::services::scheduler::{ScheduleHandle, ScheduledTask, TickScheduler};
use crate::services::time_provider::TimeProvider;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::Span;
use uuid::Uuid;

/// Countdown driven by a [`TickScheduler`]
#[derive(Clone)]
pub struct CountdownService {
    countdown: Arc<Mutex<Countdown>>,
    registration: Arc<Mutex<Option<ScheduleHandle>>>,

    /// Bumped on every start; a wake-up from an older registration is dropped
    generation: Arc<AtomicU64>,

    scheduler: Arc<dyn TickScheduler>,
    tick_interval: Duration,
    id: Uuid,
}

impl std::fmt::Debug for CountdownService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownService")
            .field("id", &self.id)
            .field("tick_interval", &self.tick_interval)
            .field("registration", &*lock(&self.registration))
            .finish_non_exhaustive()
    }
}

impl CountdownService {
    /// Create an idle countdown ticking once per second
    pub fn new(
        config: CountdownConfig,
        clock: Arc<dyn TimeProvider>,
        scheduler: Arc<dyn TickScheduler>,
    ) -> Self {
        Self::with_tick_interval(
            config,
            clock,
            scheduler,
            Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
        )
    }

    /// Create an idle countdown with a custom wake-up period
    pub fn with_tick_interval(
        config: CountdownConfig,
        clock: Arc<dyn TimeProvider>,
        scheduler: Arc<dyn TickScheduler>,
        tick_interval: Duration,
    ) -> Self {
        let countdown = Countdown::new(config, clock);
        let id = countdown.id();

        Self {
            countdown: Arc::new(Mutex::new(countdown)),
            registration: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            scheduler,
            tick_interval,
            id,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Start counting; ignored when running or completed
    pub fn start(&self) {
        self.begin("start");
    }

    /// Continue after a pause; ignored when running or completed
    pub fn resume(&self) {
        self.begin("resume");
    }

    /// Stop counting, dropping paused progress
    pub fn stop(&self) {
        let span = countdown_span!("stop", self.id);
        let _entered = span.enter();
        let handle = {
            let mut countdown = lock(&self.countdown);
            countdown.stop();
            record_span(&span, &countdown);
            log_countdown_state_change(
                self.id,
                "stop",
                countdown.state(),
                countdown.remaining(),
                countdown.duration_seconds(),
            );
            lock(&self.registration).take()
        };
        self.cancel(handle);
    }

    /// Freeze the elapsed count; ignored when not running
    pub fn pause(&self) {
        let span = countdown_span!("pause", self.id);
        let _entered = span.enter();
        let handle = {
            let mut countdown = lock(&self.countdown);
            let paused = countdown.pause();
            record_span(&span, &countdown);
            if !paused {
                log_countdown_ignored(self.id, "pause", countdown.state());
                return;
            }
            log_countdown_state_change(
                self.id,
                "pause",
                countdown.state(),
                countdown.remaining(),
                countdown.duration_seconds(),
            );
            lock(&self.registration).take()
        };
        self.cancel(handle);
    }

    /// Return to idle with cleared thresholds, optionally with a new duration
    pub fn reset(&self, new_duration_seconds: Option<u64>) {
        let span = countdown_span!("reset", self.id);
        let _entered = span.enter();
        let handle = {
            let mut countdown = lock(&self.countdown);
            countdown.reset(new_duration_seconds);
            record_span(&span, &countdown);
            log_countdown_state_change(
                self.id,
                "reset",
                countdown.state(),
                countdown.remaining(),
                countdown.duration_seconds(),
            );
            lock(&self.registration).take()
        };
        self.cancel(handle);
    }

    pub fn remaining(&self) -> u64 {
        lock(&self.countdown).remaining()
    }

    pub fn formatted_remaining(&self) -> String {
        lock(&self.countdown).formatted_remaining()
    }

    pub fn state(&self) -> CountdownState {
        lock(&self.countdown).state()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.countdown).is_running()
    }

    pub fn snapshot(&self) -> CountdownSnapshot {
        lock(&self.countdown).snapshot()
    }

    /// Whether a periodic wake-up is currently registered
    pub fn is_scheduled(&self) -> bool {
        lock(&self.registration).is_some()
    }

    fn begin(&self, operation: &str) {
        let span = countdown_span!(operation, self.id);
        let _entered = span.enter();
        let mut countdown = lock(&self.countdown);
        let started = countdown.start();
        record_span(&span, &countdown);
        if !started {
            log_countdown_ignored(self.id, operation, countdown.state());
            return;
        }

        log_countdown_state_change(
            self.id,
            operation,
            countdown.state(),
            countdown.remaining(),
            countdown.duration_seconds(),
        );

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = self
            .scheduler
            .schedule_repeating(self.tick_interval, self.tick_task(generation));
        *lock(&self.registration) = Some(handle);
    }

    fn tick_task(&self, generation: u64) -> ScheduledTask {
        let countdown = Arc::clone(&self.countdown);
        let registration = Arc::clone(&self.registration);
        let current_generation = Arc::clone(&self.generation);
        let id = self.id;

        Box::new(move || {
            let span = countdown_span!(tracing::Level::TRACE, "tick", id);
            let _entered = span.enter();
            let mut countdown = lock(&countdown);
            if current_generation.load(Ordering::SeqCst) != generation {
                return ControlFlow::Break(());
            }
            let Some(outcome) = countdown.tick() else {
                return ControlFlow::Break(());
            };
            record_span(&span, &countdown);

            log_countdown_tick(id, outcome.elapsed_seconds, outcome.remaining_seconds);
            if let Some(threshold) = outcome.threshold {
                log_threshold_crossed(id, threshold, outcome.remaining_seconds);
            }

            if outcome.completed {
                log_countdown_completed(id, countdown.duration_seconds());
                lock(&registration).take();
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    fn cancel(&self, handle: Option<ScheduleHandle>) {
        if let Some(handle) = handle {
            self.scheduler.cancel(handle);
        }
    }
}

fn record_span(span: &Span, countdown: &Countdown) {
    span.record("state", tracing::field::display(countdown.state()));
    span.record("remaining", countdown.remaining());
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
