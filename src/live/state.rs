use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiveSimulationState {
    pub is_active: bool,
    /// Only ever grows.
    pub update_count: u64,
    pub last_update: Option<DateTime<Utc>>,
    /// Bumped on every start/stop so a tick armed before a stop can tell it is stale.
    #[serde(skip)]
    pub generation: u64,
}

impl LiveSimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_update(&mut self, at: DateTime<Utc>) {
        self.update_count = self.update_count.saturating_add(1);
        self.last_update = Some(at);
    }

    pub fn activate(&mut self) -> u64 {
        self.is_active = true;
        self.generation += 1;
        self.generation
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.generation += 1;
    }

    pub fn accepts_tick(&self, generation: u64) -> bool {
        self.is_active && self.generation == generation
    }
}
