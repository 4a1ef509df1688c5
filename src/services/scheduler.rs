//! Periodic wake-up sources
//!
//! A [`TickScheduler`] runs a task repeatedly at a fixed period until the task
//! asks to stop or the registration is cancelled. [`TokioScheduler`] backs it
//! with tokio intervals; [`ManualScheduler`] fires only when told to, for
//! headless hosts and deterministic tests.

use crate::error::{CountdownError, CountdownResult};
use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Repeating task; `ControlFlow::Break` ends the repetition
pub type ScheduledTask = Box<dyn FnMut() -> ControlFlow<()> + Send>;

/// Identifies one repeating registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleHandle(u64);

impl ScheduleHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Host facility for "run this every N milliseconds" and "stop running it"
pub trait TickScheduler: Send + Sync {
    /// Run `task` every `period`, first run one period from now
    fn schedule_repeating(&self, period: Duration, task: ScheduledTask) -> ScheduleHandle;

    /// Stop a registration. Unknown or finished handles are ignored.
    fn cancel(&self, handle: ScheduleHandle);
}

/// Scheduler running each registration as a tokio task
#[derive(Debug)]
pub struct TokioScheduler {
    runtime: Handle,
    next_id: AtomicU64,
    tasks: Arc<Mutex<HashMap<u64, AbortHandle>>>,
}

impl TokioScheduler {
    /// Bind to the runtime of the calling context
    pub fn try_current() -> CountdownResult<Self> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|e| CountdownError::SchedulerUnavailable(e.to_string()))
    }

    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(1),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of registrations still running
    pub fn active_count(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl TickScheduler for TokioScheduler {
    fn schedule_repeating(&self, period: Duration, mut task: ScheduledTask) -> ScheduleHandle {
        // tokio intervals reject a zero period
        let period = period.max(Duration::from_millis(1));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.tasks);

        // Hold the registry while spawning so the task cannot deregister
        // itself before it has been registered
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let join = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if task().is_break() {
                    break;
                }
            }
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
            debug!(registration = id, "Repeating task finished");
        });
        tasks.insert(id, join.abort_handle());

        ScheduleHandle(id)
    }

    fn cancel(&self, handle: ScheduleHandle) {
        let removed = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0);
        if let Some(abort) = removed {
            abort.abort();
            debug!(registration = handle.0, "Repeating task cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for abort in tasks.values() {
            abort.abort();
        }
    }
}

struct Registration {
    period: Duration,
    /// Taken out while the task runs
    task: Option<ScheduledTask>,
}

/// Scheduler that only runs tasks when [`ManualScheduler::fire`] is called
#[derive(Default)]
pub struct ManualScheduler {
    next_id: AtomicU64,
    registrations: Mutex<BTreeMap<u64, Registration>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every registered task once, in registration order.
    ///
    /// Returns how many tasks ran. Tasks may cancel registrations (their own
    /// included) while running.
    pub fn fire(&self) -> usize {
        let ids: Vec<u64> = self.lock().keys().copied().collect();
        let mut ran = 0;

        for id in ids {
            let Some(mut task) = self.lock().get_mut(&id).and_then(|r| r.task.take()) else {
                continue;
            };

            let flow = task();
            ran += 1;

            let mut registrations = self.lock();
            match flow {
                // a registration cancelled while running stays gone
                ControlFlow::Continue(()) => {
                    if let Some(registration) = registrations.get_mut(&id) {
                        registration.task = Some(task);
                    }
                }
                ControlFlow::Break(()) => {
                    registrations.remove(&id);
                }
            }
        }

        ran
    }

    /// Fire `times` rounds, stopping early once nothing is registered
    pub fn fire_times(&self, times: usize) -> usize {
        let mut ran = 0;
        for _ in 0..times {
            if self.pending() == 0 {
                break;
            }
            ran += self.fire();
        }
        ran
    }

    /// Number of live registrations
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    pub fn is_scheduled(&self, handle: ScheduleHandle) -> bool {
        self.lock().contains_key(&handle.0)
    }

    pub fn period_of(&self, handle: ScheduleHandle) -> Option<Duration> {
        self.lock().get(&handle.0).map(|r| r.period)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, Registration>> {
        self.registrations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule_repeating(&self, period: Duration, task: ScheduledTask) -> ScheduleHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(
            id,
            Registration {
                period,
                task: Some(task),
            },
        );
        ScheduleHandle(id)
    }

    fn cancel(&self, handle: ScheduleHandle) {
        self.lock().remove(&handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_task(counter: &Arc<AtomicUsize>, stop_after: usize) -> ScheduledTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            let runs = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if runs >= stop_after {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    #[test]
    fn test_manual_scheduler_runs_until_break() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle =
            scheduler.schedule_repeating(Duration::from_secs(1), counting_task(&counter, 3));

        assert_eq!(scheduler.period_of(handle), Some(Duration::from_secs(1)));
        assert_eq!(scheduler.fire_times(10), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(!scheduler.is_scheduled(handle));
        assert_eq!(scheduler.fire(), 0);
    }

    #[test]
    fn test_manual_scheduler_cancel() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle =
            scheduler.schedule_repeating(Duration::from_secs(1), counting_task(&counter, 100));

        scheduler.fire();
        scheduler.cancel(handle);
        scheduler.fire();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);

        // Cancelling twice is harmless
        scheduler.cancel(handle);
    }

    #[test]
    fn test_manual_scheduler_registrations_are_independent() {
        let scheduler = ManualScheduler::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let first_handle =
            scheduler.schedule_repeating(Duration::from_secs(1), counting_task(&first, 100));
        let second_handle =
            scheduler.schedule_repeating(Duration::from_secs(1), counting_task(&second, 100));
        assert_ne!(first_handle, second_handle);

        scheduler.fire();
        scheduler.cancel(first_handle);
        scheduler.fire();

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_tokio_scheduler_requires_runtime() {
        let result = TokioScheduler::try_current();
        assert!(matches!(result, Err(CountdownError::SchedulerUnavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_repeats_and_finishes() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_repeating(Duration::from_millis(100), counting_task(&counter, 3));

        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_cancel_stops_task() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle =
            scheduler.schedule_repeating(Duration::from_millis(100), counting_task(&counter, 100));

        tokio::time::sleep(Duration::from_millis(250)).await;
        scheduler.cancel(handle);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.active_count(), 0);
    }
}
