use std::sync::{Arc, Mutex, MutexGuard};

use crate::events::{DashboardEvent, EventBus};
use crate::views::View;

use super::SpeechBackend;

#[derive(Debug, Default)]
struct NarrationState {
    enabled: bool,
    is_narrating: bool,
    /// Id of the utterance allowed to clear `is_narrating` when it ends.
    utterance: u64,
}

struct NarrationInner {
    state: Mutex<NarrationState>,
    backend: Arc<dyn SpeechBackend>,
    events: EventBus,
}

/// Reads each view's script aloud, one utterance at a time.
///
/// The sequencer does not wait for narration: an auto-advance simply
/// interrupts the current utterance with the next view's script.
#[derive(Clone)]
pub struct NarrationCoordinator {
    inner: Arc<NarrationInner>,
}

impl NarrationCoordinator {
    pub fn new(backend: Arc<dyn SpeechBackend>, events: EventBus, enabled: bool) -> Self {
        Self {
            inner: Arc::new(NarrationInner {
                state: Mutex::new(NarrationState {
                    enabled,
                    ..NarrationState::default()
                }),
                backend,
                events,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, NarrationState> {
        match self.inner.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn is_narrating(&self) -> bool {
        self.state().is_narrating
    }

    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state().enabled = enabled;
        if !enabled {
            self.stop();
        }
    }

    /// Cancels whatever is being said and starts on `view`'s script.
    pub fn narrate_view(&self, view: &View) {
        if !self.inner.backend.is_available() || !self.is_enabled() {
            return;
        }

        self.inner.backend.cancel();
        let (utterance, was_narrating) = {
            let mut state = self.state();
            state.utterance = state.utterance.wrapping_add(1);
            let was_narrating = state.is_narrating;
            state.is_narrating = true;
            (state.utterance, was_narrating)
        };
        if !was_narrating {
            self.emit(true);
        }

        let this = self.clone();
        self.inner
            .backend
            .speak(view.narration, Box::new(move || this.finished(utterance)));
    }

    /// Force-cancels the current utterance, if any.
    pub fn stop(&self) {
        self.inner.backend.cancel();
        let was_narrating = {
            let mut state = self.state();
            state.utterance = state.utterance.wrapping_add(1);
            std::mem::replace(&mut state.is_narrating, false)
        };
        if was_narrating {
            self.emit(false);
        }
    }

    fn finished(&self, utterance: u64) {
        let cleared = {
            let mut state = self.state();
            if state.utterance != utterance || !state.is_narrating {
                false
            } else {
                state.is_narrating = false;
                true
            }
        };
        if cleared {
            self.emit(false);
        }
    }

    fn emit(&self, is_narrating: bool) {
        self.inner
            .events
            .emit(DashboardEvent::NarrationChanged { is_narrating });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::{TimedSpeech, UnavailableSpeech};
    use crate::scheduler::ManualScheduler;
    use crate::views::ViewRegistry;

    fn timed(scheduler: &Arc<ManualScheduler>) -> NarrationCoordinator {
        let backend = Arc::new(TimedSpeech::new(scheduler.clone(), 600));
        NarrationCoordinator::new(backend, EventBus::new(), true)
    }

    #[test]
    fn narration_clears_flag_when_finished() {
        let scheduler = Arc::new(ManualScheduler::new());
        let narration = timed(&scheduler);
        let registry = ViewRegistry::standard();

        narration.narrate_view(registry.get(0).unwrap());
        assert!(narration.is_narrating());

        scheduler.advance_ms(60_000);
        assert!(!narration.is_narrating());
    }

    #[test]
    fn new_view_interrupts_previous_utterance() {
        let scheduler = Arc::new(ManualScheduler::new());
        let narration = timed(&scheduler);
        let registry = ViewRegistry::standard();

        narration.narrate_view(registry.get(0).unwrap());
        scheduler.advance_ms(500);
        narration.narrate_view(registry.get(1).unwrap());

        // Only the second utterance is still scheduled.
        assert_eq!(scheduler.pending(), 1);
        assert!(narration.is_narrating());
    }

    #[test]
    fn stop_cancels_immediately() {
        let scheduler = Arc::new(ManualScheduler::new());
        let narration = timed(&scheduler);
        narration.narrate_view(ViewRegistry::standard().get(2).unwrap());

        narration.stop();
        assert!(!narration.is_narrating());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn unavailable_backend_never_narrates() {
        let narration =
            NarrationCoordinator::new(Arc::new(UnavailableSpeech), EventBus::new(), true);
        narration.narrate_view(ViewRegistry::standard().get(0).unwrap());
        assert!(!narration.is_narrating());
    }

    #[test]
    fn disabled_narration_is_silent() {
        let scheduler = Arc::new(ManualScheduler::new());
        let narration = timed(&scheduler);
        narration.set_enabled(false);
        narration.narrate_view(ViewRegistry::standard().get(0).unwrap());
        assert!(!narration.is_narrating());
        assert_eq!(scheduler.pending(), 0);
    }
}
