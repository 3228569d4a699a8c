use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::events::{DashboardEvent, EventBus, ViewChangeReason};
use crate::scheduler::{ScheduleHandle, Scheduler};
use crate::views::{ViewId, ViewRegistry};

use super::{SequencerState, SpeedPreset};

// Ticks arrive every 100 ms; keep them quiet unless chasing a timing bug.
const ENABLE_LOGS: bool = false;
use crate::log_debug;

pub const DEFAULT_TICK_MS: u64 = 100;

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SequencerSnapshot {
    pub state: SequencerState,
    pub current_view_id: Option<ViewId>,
    pub view_count: usize,
}

struct SequencerInner {
    state: Mutex<SequencerState>,
    ticker: Mutex<Option<ScheduleHandle>>,
    registry: Arc<ViewRegistry>,
    scheduler: Arc<dyn Scheduler>,
    events: EventBus,
    tick_ms: u64,
}

/// Cycles the registry's views on a timer, with manual override.
///
/// The state is only changed by its own tick and by the public commands.
/// Every command that moves the view or stops playback rearms or disarms
/// the tick timer before returning, so a tick armed earlier can never
/// advance the view a second time.
#[derive(Clone)]
pub struct AutoDemoSequencer {
    inner: Arc<SequencerInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl AutoDemoSequencer {
    pub fn new(
        registry: Arc<ViewRegistry>,
        scheduler: Arc<dyn Scheduler>,
        events: EventBus,
        interval_ms: u64,
        tick_ms: u64,
    ) -> Self {
        Self {
            inner: Arc::new(SequencerInner {
                state: Mutex::new(SequencerState::new(interval_ms)),
                ticker: Mutex::new(None),
                registry,
                scheduler,
                events,
                tick_ms: tick_ms.max(1),
            }),
        }
    }

    pub fn state(&self) -> SequencerState {
        lock(&self.inner.state).clone()
    }

    pub fn snapshot(&self) -> SequencerSnapshot {
        let state = self.state();
        SequencerSnapshot {
            current_view_id: self.inner.registry.get(state.current_index).map(|v| v.id),
            view_count: self.inner.registry.len(),
            state,
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.state).is_running
    }

    pub fn current_index(&self) -> usize {
        lock(&self.inner.state).current_index
    }

    pub fn current_view_id(&self) -> Option<ViewId> {
        self.inner.registry.get(self.current_index()).map(|v| v.id)
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.inner.registry
    }

    /// Starts or stops the auto-demo. Returns the new `is_running`.
    pub fn toggle_demo(&self) -> bool {
        if self.is_running() {
            self.pause();
            false
        } else {
            self.play();
            true
        }
    }

    /// Starts playback from 0% of the current view. No-op when running.
    pub fn play(&self) {
        let generation = {
            let mut state = lock(&self.inner.state);
            if state.is_running || self.inner.registry.is_empty() {
                return;
            }
            state.is_running = true;
            state.reset_progress();
            state.bump_generation()
        };
        self.arm(generation);
        self.inner
            .events
            .emit(DashboardEvent::DemoToggled { is_running: true });
    }

    /// Stops playback. No tick mutates state after this returns.
    pub fn pause(&self) {
        let generation = {
            let mut state = lock(&self.inner.state);
            if !state.is_running {
                return;
            }
            state.is_running = false;
            state.bump_generation()
        };
        self.disarm(generation);
        self.inner
            .events
            .emit(DashboardEvent::DemoToggled { is_running: false });
    }

    pub fn next_view(&self) {
        self.move_by(1);
    }

    pub fn prev_view(&self) {
        self.move_by(-1);
    }

    /// Jumps straight to `index`. Out-of-range indices are ignored.
    pub fn select_view(&self, index: usize) {
        let len = self.inner.registry.len();
        let moved = {
            let mut state = lock(&self.inner.state);
            if !state.select(index, len) {
                return;
            }
            let generation = state.bump_generation();
            (state.current_index, generation, state.is_running)
        };
        self.after_manual_move(moved);
    }

    /// Sets the per-view dwell time. Zero is rejected.
    ///
    /// Time already spent on the current view is kept and measured against
    /// the new interval on the next tick.
    pub fn set_speed(&self, interval_ms: u64) -> Result<()> {
        if interval_ms == 0 {
            bail!("interval_ms must be greater than zero");
        }
        let mut state = lock(&self.inner.state);
        state.interval_ms = interval_ms;
        state.progress =
            (state.elapsed_ms as f64 * 100.0 / interval_ms as f64).min(100.0);
        Ok(())
    }

    pub fn set_speed_preset(&self, preset: SpeedPreset) {
        // Presets are all non-zero.
        let _ = self.set_speed(preset.interval_ms());
    }

    fn move_by(&self, offset: isize) {
        let len = self.inner.registry.len();
        if len == 0 {
            return;
        }
        let moved = {
            let mut state = lock(&self.inner.state);
            state.step(offset, len);
            let generation = state.bump_generation();
            (state.current_index, generation, state.is_running)
        };
        self.after_manual_move(moved);
    }

    fn after_manual_move(&self, (index, generation, running): (usize, u64, bool)) {
        if running {
            self.arm(generation);
        } else {
            self.disarm(generation);
        }
        self.emit_view_changed(index, ViewChangeReason::Manual);
    }

    fn arm(&self, generation: u64) {
        let weak: Weak<SequencerInner> = Arc::downgrade(&self.inner);
        let handle = self.inner.scheduler.schedule_repeating(
            Duration::from_millis(self.inner.tick_ms),
            Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    AutoDemoSequencer { inner }.on_tick(generation);
                }
            }),
        );
        // The slot only ever holds the timer of the current generation.
        let state = lock(&self.inner.state);
        if !state.is_running || state.generation != generation {
            handle.cancel();
            return;
        }
        // Replacing the old handle drops it, which cancels the old timer.
        *lock(&self.inner.ticker) = Some(handle);
    }

    /// Cancels the timer, unless a newer command has armed one since
    /// `generation` was issued.
    fn disarm(&self, generation: u64) {
        let state = lock(&self.inner.state);
        if state.generation != generation {
            return;
        }
        if let Some(handle) = lock(&self.inner.ticker).take() {
            handle.cancel();
        }
    }

    fn on_tick(&self, generation: u64) {
        let len = self.inner.registry.len();
        let advanced = {
            let mut state = lock(&self.inner.state);
            if !state.is_running || state.generation != generation {
                return;
            }
            let advanced = state.advance_by(self.inner.tick_ms, len);
            log_debug!(
                "sequencer tick: view {} at {:.1}%",
                state.current_index,
                state.progress
            );
            advanced.then_some(state.current_index)
        };

        if let Some(index) = advanced {
            self.emit_view_changed(index, ViewChangeReason::Auto);
        }
    }

    fn emit_view_changed(&self, index: usize, reason: ViewChangeReason) {
        if let Some(view) = self.inner.registry.get(index) {
            self.inner.events.emit(DashboardEvent::ViewChanged {
                view_id: view.id,
                index,
                reason,
            });
        }
    }
}

impl Drop for SequencerInner {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.ticker).take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;

    fn sequencer(interval_ms: u64) -> (Arc<ManualScheduler>, AutoDemoSequencer, EventBus) {
        let scheduler = Arc::new(ManualScheduler::new());
        let events = EventBus::new();
        let sequencer = AutoDemoSequencer::new(
            Arc::new(ViewRegistry::standard()),
            scheduler.clone(),
            events.clone(),
            interval_ms,
            DEFAULT_TICK_MS,
        );
        (scheduler, sequencer, events)
    }

    fn record_views(events: &EventBus) -> Arc<Mutex<Vec<(ViewId, ViewChangeReason)>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        events.subscribe(move |event| {
            if let DashboardEvent::ViewChanged { view_id, reason, .. } = event {
                sink.lock().unwrap().push((*view_id, *reason));
            }
        });
        seen
    }

    #[test]
    fn prev_from_first_wraps_to_last() {
        let (_scheduler, sequencer, _events) = sequencer(5000);
        sequencer.prev_view();
        assert_eq!(sequencer.current_index(), 3);
        assert_eq!(sequencer.current_view_id(), Some(ViewId::Workflow));
    }

    #[test]
    fn n_steps_land_on_modular_index() {
        let (_scheduler, sequencer, _events) = sequencer(5000);
        for n in 0..11usize {
            sequencer.select_view(1);
            for _ in 0..n {
                sequencer.next_view();
            }
            assert_eq!(sequencer.current_index(), (1 + n) % 4);

            sequencer.select_view(1);
            for _ in 0..n {
                sequencer.prev_view();
            }
            assert_eq!(sequencer.current_index(), (1 + 4 * 11 - n) % 4);
        }
    }

    #[test]
    fn toggle_twice_restores_running_flag() {
        let (_scheduler, sequencer, _events) = sequencer(5000);
        assert!(sequencer.toggle_demo());
        assert_eq!(sequencer.state().progress, 0.0);
        assert!(!sequencer.toggle_demo());
        assert!(!sequencer.is_running());
    }

    #[test]
    fn twelve_and_a_half_seconds_is_two_advances() {
        let (scheduler, sequencer, events) = sequencer(5000);
        let seen = record_views(&events);

        sequencer.toggle_demo();
        scheduler.advance_ms(12_500);

        let state = sequencer.state();
        assert_eq!(state.current_index, 2);
        assert_eq!(state.progress, 50.0);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (ViewId::Patients, ViewChangeReason::Auto),
                (ViewId::Shap, ViewChangeReason::Auto)
            ]
        );
    }

    #[test]
    fn pause_stops_ticks_immediately() {
        let (scheduler, sequencer, _events) = sequencer(1000);
        sequencer.play();
        scheduler.advance_ms(500);
        sequencer.pause();
        scheduler.advance_ms(10_000);

        let state = sequencer.state();
        assert_eq!(state.current_index, 0);
        assert_eq!(state.progress, 50.0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn manual_move_rearms_without_double_advance() {
        let (scheduler, sequencer, events) = sequencer(1000);
        let seen = record_views(&events);
        sequencer.play();
        scheduler.advance_ms(900);

        sequencer.next_view();
        assert_eq!(sequencer.state().progress, 0.0);
        assert_eq!(scheduler.pending(), 1);

        // The old timer would have fired at 1000 ms; the rearmed one needs a full interval.
        scheduler.advance_ms(900);
        assert_eq!(sequencer.current_index(), 1);
        scheduler.advance_ms(100);
        assert_eq!(sequencer.current_index(), 2);

        let reasons: Vec<ViewChangeReason> = seen.lock().unwrap().iter().map(|(_, r)| *r).collect();
        assert_eq!(reasons, vec![ViewChangeReason::Manual, ViewChangeReason::Auto]);
    }

    #[test]
    fn set_speed_round_trips_and_rejects_zero() {
        let (_scheduler, sequencer, _events) = sequencer(5000);
        sequencer.set_speed(2500).unwrap();
        assert_eq!(sequencer.state().interval_ms, 2500);

        assert!(sequencer.set_speed(0).is_err());
        assert_eq!(sequencer.state().interval_ms, 2500);

        sequencer.set_speed_preset(SpeedPreset::Fast);
        assert_eq!(sequencer.state().interval_ms, 4000);
    }

    #[test]
    fn shorter_interval_applies_to_elapsed_time() {
        let (scheduler, sequencer, _events) = sequencer(5000);
        sequencer.play();
        scheduler.advance_ms(3000);
        sequencer.set_speed(2000).unwrap();
        assert_eq!(sequencer.current_index(), 0);

        scheduler.advance_ms(100);
        assert_eq!(sequencer.current_index(), 1);
        assert_eq!(sequencer.state().progress, 0.0);
    }

    #[test]
    fn late_arm_or_disarm_keeps_the_current_timer() {
        let (scheduler, sequencer, _events) = sequencer(1000);
        sequencer.play();
        let stale = sequencer.state().generation;
        sequencer.next_view();

        // A command that lost the race arrives with an older generation.
        sequencer.arm(stale);
        sequencer.disarm(stale);
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance_ms(1000);
        assert_eq!(sequencer.current_index(), 2);
    }

    #[test]
    fn dropping_the_sequencer_cancels_its_timer() {
        let (scheduler, sequencer, _events) = sequencer(1000);
        sequencer.play();
        assert_eq!(scheduler.pending(), 1);
        drop(sequencer);
        assert_eq!(scheduler.pending(), 0);
    }
}
