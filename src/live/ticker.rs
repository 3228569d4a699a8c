use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::events::{DashboardEvent, EventBus};
use crate::scheduler::{ScheduleHandle, Scheduler};

use super::{LiveSimulationState, MockMetrics};

const ENABLE_LOGS: bool = true;
use crate::{log_debug, log_info};

const PATIENT_COUNT: usize = 8;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub state: LiveSimulationState,
    pub metrics: MockMetrics,
}

struct LiveInner {
    state: Mutex<LiveSimulationState>,
    metrics: Mutex<(MockMetrics, StdRng)>,
    timer: Mutex<Option<ScheduleHandle>>,
    scheduler: Arc<dyn Scheduler>,
    events: EventBus,
    interval: Duration,
}

/// Periodically perturbs the mock metrics so the dashboard looks live.
///
/// Runs on its own schedule, independent of the sequencer.
#[derive(Clone)]
pub struct LiveSimulationTicker {
    inner: Arc<LiveInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl LiveSimulationTicker {
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        events: EventBus,
        interval: Duration,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let metrics = MockMetrics::generate(&mut rng, PATIENT_COUNT);

        Self {
            inner: Arc::new(LiveInner {
                state: Mutex::new(LiveSimulationState::new()),
                metrics: Mutex::new((metrics, rng)),
                timer: Mutex::new(None),
                scheduler,
                events,
                interval,
            }),
        }
    }

    pub fn is_active(&self) -> bool {
        lock(&self.inner.state).is_active
    }

    pub fn state(&self) -> LiveSimulationState {
        lock(&self.inner.state).clone()
    }

    pub fn metrics(&self) -> MockMetrics {
        lock(&self.inner.metrics).0.clone()
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        LiveSnapshot {
            state: self.state(),
            metrics: self.metrics(),
        }
    }

    /// Flips live updates on or off. Returns the new `is_active`.
    pub fn toggle(&self) -> bool {
        if self.is_active() {
            self.stop();
            false
        } else {
            self.start();
            true
        }
    }

    /// Arms the ticker. The first update lands one full interval later.
    pub fn start(&self) {
        let generation = {
            let mut state = lock(&self.inner.state);
            if state.is_active {
                return;
            }
            state.activate()
        };

        let weak: Weak<LiveInner> = Arc::downgrade(&self.inner);
        let handle = self.inner.scheduler.schedule_repeating(
            self.inner.interval,
            Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    LiveSimulationTicker { inner }.on_tick(generation);
                }
            }),
        );
        {
            // A stop that slipped in while scheduling owns the state now.
            let state = lock(&self.inner.state);
            if !state.accepts_tick(generation) {
                handle.cancel();
                return;
            }
            *lock(&self.inner.timer) = Some(handle);
        }

        log_info!("live simulation started ({} ms interval)", self.inner.interval.as_millis());
        self.inner
            .events
            .emit(DashboardEvent::LiveToggled { is_active: true });
    }

    /// Disarms the ticker. No update lands after this returns.
    pub fn stop(&self) {
        {
            let mut state = lock(&self.inner.state);
            if !state.is_active {
                return;
            }
            state.deactivate();
        }
        if let Some(handle) = lock(&self.inner.timer).take() {
            handle.cancel();
        }

        log_info!("live simulation stopped");
        self.inner
            .events
            .emit(DashboardEvent::LiveToggled { is_active: false });
    }

    /// Recomputes the mock values now, whether or not the ticker is running.
    pub fn update_simulation(&self) -> u64 {
        self.apply_update(None).unwrap_or_default()
    }

    fn on_tick(&self, generation: u64) {
        self.apply_update(Some(generation));
    }

    /// Perturbs the metrics and counts the update. A tick passes its
    /// generation and is dropped when the ticker was stopped or restarted
    /// since it was armed. The check and the update share one state lock.
    fn apply_update(&self, generation: Option<u64>) -> Option<u64> {
        let update_count = {
            let mut state = lock(&self.inner.state);
            if let Some(generation) = generation {
                if !state.accepts_tick(generation) {
                    return None;
                }
            }
            {
                let mut guard = lock(&self.inner.metrics);
                let (metrics, rng) = &mut *guard;
                metrics.perturb(rng);
            }
            state.record_update(Utc::now());
            state.update_count
        };

        log_debug!("live update #{}", update_count);
        self.inner
            .events
            .emit(DashboardEvent::LiveUpdated { update_count });
        Some(update_count)
    }
}

impl Drop for LiveInner {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.timer).take() {
            handle.cancel();
        }
    }
}
