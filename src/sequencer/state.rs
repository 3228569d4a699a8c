use serde::{Deserialize, Serialize};

pub const DEFAULT_INTERVAL_MS: u64 = 8_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SpeedPreset {
    Slow,
    Normal,
    Fast,
}

impl SpeedPreset {
    pub fn interval_ms(&self) -> u64 {
        match self {
            SpeedPreset::Slow => 12_000,
            SpeedPreset::Normal => DEFAULT_INTERVAL_MS,
            SpeedPreset::Fast => 4_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SequencerState {
    pub is_running: bool,
    pub current_index: usize,
    pub interval_ms: u64,
    /// Percentage of `interval_ms` spent on the current view, in `[0, 100]`.
    pub progress: f64,
    /// Time spent on the current view; `progress` is derived from it so
    /// repeated fractional increments never drift past a boundary.
    #[serde(skip)]
    pub elapsed_ms: u64,
    /// Bumped whenever the tick timer is rearmed or disarmed.
    #[serde(skip)]
    pub generation: u64,
}

impl SequencerState {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            is_running: false,
            current_index: 0,
            interval_ms: interval_ms.max(1),
            progress: 0.0,
            elapsed_ms: 0,
            generation: 0,
        }
    }

    pub fn reset_progress(&mut self) {
        self.elapsed_ms = 0;
        self.progress = 0.0;
    }

    /// Moves `offset` views from the current one, wrapping both ways.
    pub fn step(&mut self, offset: isize, view_count: usize) {
        if view_count == 0 {
            return;
        }
        let len = view_count as isize;
        self.current_index = (self.current_index as isize + offset).rem_euclid(len) as usize;
        self.reset_progress();
    }

    pub fn select(&mut self, index: usize, view_count: usize) -> bool {
        if index >= view_count {
            return false;
        }
        self.current_index = index;
        self.reset_progress();
        true
    }

    /// Accounts `delta_ms` of running time. Returns true when the view advanced.
    pub fn advance_by(&mut self, delta_ms: u64, view_count: usize) -> bool {
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        if self.elapsed_ms >= self.interval_ms {
            self.step(1, view_count);
            return true;
        }
        self.progress = (self.elapsed_ms as f64 * 100.0 / self.interval_ms as f64).min(100.0);
        false
    }

    pub fn bump_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}

impl Default for SequencerState {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_MS)
    }
}
