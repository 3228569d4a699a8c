use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::scheduler::{ScheduleHandle, Scheduler};

/// Completion callback handed to the backend with each utterance.
pub type SpeechDone = Box<dyn FnOnce() + Send + 'static>;

pub trait SpeechBackend: Send + Sync {
    fn is_available(&self) -> bool;

    /// Starts speaking `text`; `done` runs when the utterance finishes on
    /// its own. It is not called for cancelled utterances.
    fn speak(&self, text: &str, done: SpeechDone);

    fn cancel(&self);
}

/// Host without speech synthesis. Narration silently does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSpeech;

impl SpeechBackend for UnavailableSpeech {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&self, _text: &str, _done: SpeechDone) {}

    fn cancel(&self) {}
}

/// Headless stand-in for a speech engine: logs the text and reports the
/// utterance finished after the time a reader at `words_per_minute`
/// would need.
pub struct TimedSpeech {
    scheduler: Arc<dyn Scheduler>,
    words_per_minute: u32,
    current: Mutex<Option<ScheduleHandle>>,
}

impl TimedSpeech {
    pub fn new(scheduler: Arc<dyn Scheduler>, words_per_minute: u32) -> Self {
        Self {
            scheduler,
            words_per_minute: words_per_minute.max(1),
            current: Mutex::new(None),
        }
    }

    pub fn duration_for(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count().max(1) as u64;
        Duration::from_millis(words * 60_000 / self.words_per_minute as u64)
    }

    fn current(&self) -> MutexGuard<'_, Option<ScheduleHandle>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SpeechBackend for TimedSpeech {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&self, text: &str, done: SpeechDone) {
        log::info!("narrating: {text}");
        let done = Mutex::new(Some(done));
        let handle = self.scheduler.schedule_once(
            self.duration_for(text),
            Arc::new(move || {
                let callback = match done.lock() {
                    Ok(mut guard) => guard.take(),
                    Err(poisoned) => poisoned.into_inner().take(),
                };
                if let Some(callback) = callback {
                    callback();
                }
            }),
        );
        *self.current() = Some(handle);
    }

    fn cancel(&self) {
        if let Some(handle) = self.current().take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn duration_scales_with_word_count() {
        let speech = TimedSpeech::new(Arc::new(ManualScheduler::new()), 120);
        assert_eq!(speech.duration_for("one two three four"), Duration::from_secs(2));
        assert_eq!(speech.duration_for(""), Duration::from_millis(500));
    }

    #[test]
    fn cancel_suppresses_completion() {
        let scheduler = Arc::new(ManualScheduler::new());
        let speech = TimedSpeech::new(scheduler.clone(), 60);
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        speech.speak("hello", Box::new(move || flag.store(true, Ordering::SeqCst)));
        speech.cancel();
        scheduler.advance_ms(5_000);

        assert!(!finished.load(Ordering::SeqCst));
    }
}
