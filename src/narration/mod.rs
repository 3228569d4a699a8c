//! Spoken walkthrough for the auto-demo.
//!
//! The host's text-to-speech lives behind [`SpeechBackend`]. The
//! [`NarrationCoordinator`] guarantees at most one utterance at a time.

pub mod backend;
pub mod coordinator;

pub use backend::{SpeechBackend, SpeechDone, TimedSpeech, UnavailableSpeech};
pub use coordinator::NarrationCoordinator;
