pub mod controller;
pub mod state;

pub use controller::{AutoDemoSequencer, SequencerSnapshot};
pub use state::{SequencerState, SpeedPreset};
