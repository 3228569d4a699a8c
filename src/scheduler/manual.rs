use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{sanitize_period, ScheduleHandle, Scheduler, TickCallback};

struct ManualTimer {
    id: u64,
    due: Duration,
    period: Option<Duration>,
    callback: TickCallback,
    token: CancellationToken,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next_id: u64,
    timers: Vec<ManualTimer>,
}

/// Deterministic scheduler driven by [`ManualScheduler::advance`].
///
/// Callbacks run on the caller's thread, in due order (ties broken by
/// registration order), with the clock set to the exact due time. The
/// internal lock is released while a callback runs, so callbacks may
/// schedule or cancel other timers.
#[derive(Default)]
pub struct ManualScheduler {
    clock: Mutex<ManualClock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualClock> {
        match self.clock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Elapsed fake time since creation.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of live (not cancelled) timers.
    pub fn pending(&self) -> usize {
        self.lock()
            .timers
            .iter()
            .filter(|timer| !timer.token.is_cancelled())
            .count()
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Moves the clock forward by `by`, firing every callback that falls due.
    pub fn advance(&self, by: Duration) {
        let target = self.lock().now + by;

        loop {
            let callback = {
                let mut clock = self.lock();
                clock.timers.retain(|timer| !timer.token.is_cancelled());

                let next = clock
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by_key(|(_, timer)| (timer.due, timer.id))
                    .map(|(index, _)| index);

                let Some(index) = next else {
                    clock.now = target;
                    break;
                };

                let due = clock.timers[index].due;
                clock.now = due;
                let callback = clock.timers[index].callback.clone();
                match clock.timers[index].period {
                    Some(period) => clock.timers[index].due = due + period,
                    None => {
                        clock.timers.remove(index);
                    }
                }
                callback
            };

            callback();
        }
    }

    fn register(&self, delay: Duration, period: Option<Duration>, callback: TickCallback) -> ScheduleHandle {
        let token = CancellationToken::new();
        let mut clock = self.lock();
        let id = clock.next_id;
        clock.next_id += 1;
        let due = clock.now + delay;
        clock.timers.push(ManualTimer {
            id,
            due,
            period,
            callback,
            token: token.clone(),
        });
        ScheduleHandle::new(token)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, period: Duration, callback: TickCallback) -> ScheduleHandle {
        let period = sanitize_period(period);
        self.register(period, Some(period), callback)
    }

    fn schedule_once(&self, delay: Duration, callback: TickCallback) -> ScheduleHandle {
        self.register(delay, None, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, TickCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let cb_count = count.clone();
        let callback: TickCallback = Arc::new(move || {
            cb_count.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn repeating_fires_once_per_period() {
        let scheduler = ManualScheduler::new();
        let (count, callback) = counter();
        let _handle = scheduler.schedule_repeating(Duration::from_millis(100), callback);

        scheduler.advance_ms(99);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        scheduler.advance_ms(1);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        scheduler.advance_ms(1000);
        assert_eq!(count.load(Ordering::SeqCst), 11);
        assert_eq!(scheduler.now(), Duration::from_millis(1100));
    }

    #[test]
    fn cancelled_timers_are_dropped() {
        let scheduler = ManualScheduler::new();
        let (count, callback) = counter();
        let handle = scheduler.schedule_repeating(Duration::from_millis(10), callback);

        scheduler.advance_ms(30);
        handle.cancel();
        scheduler.advance_ms(100);

        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn once_fires_and_is_removed() {
        let scheduler = ManualScheduler::new();
        let (count, callback) = counter();
        let _handle = scheduler.schedule_once(Duration::from_millis(50), callback);

        scheduler.advance_ms(500);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn callbacks_can_schedule_from_inside_advance() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (count, inner_callback) = counter();
        let held: Arc<Mutex<Vec<ScheduleHandle>>> = Arc::new(Mutex::new(Vec::new()));

        let sched = scheduler.clone();
        let held_in_cb = held.clone();
        let _outer = scheduler.schedule_once(
            Duration::from_millis(10),
            Arc::new(move || {
                let handle = sched.schedule_once(Duration::from_millis(5), inner_callback.clone());
                held_in_cb.lock().unwrap().push(handle);
            }),
        );

        scheduler.advance_ms(20);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
