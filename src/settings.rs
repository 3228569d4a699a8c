use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::live::ticker::LiveSimulationTicker;
use crate::protection::DEFAULT_WARNING_MS;
use crate::sequencer::controller::DEFAULT_TICK_MS;
use crate::sequencer::state::DEFAULT_INTERVAL_MS;

pub const DEFAULT_LIVE_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SequencerSettings {
    pub interval_ms: u64,
    pub tick_ms: u64,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveSettings {
    pub interval_ms: u64,
    pub start_active: bool,
    /// Fixed RNG seed for reproducible demos; random when absent.
    pub seed: Option<u64>,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_LIVE_INTERVAL_MS,
            start_active: false,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct NarrationSettings {
    pub enabled: bool,
    pub words_per_minute: u32,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            words_per_minute: 160,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TourSettings {
    pub auto_start: bool,
}

impl Default for TourSettings {
    fn default() -> Self {
        Self { auto_start: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportSettings {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: 1440.0,
            height: 900.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProtectionSettings {
    pub warning_ms: u64,
}

impl Default for ProtectionSettings {
    fn default() -> Self {
        Self {
            warning_ms: DEFAULT_WARNING_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DemoSettings {
    pub sequencer: SequencerSettings,
    pub live: LiveSettings,
    pub narration: NarrationSettings,
    pub tour: TourSettings,
    pub viewport: ViewportSettings,
    pub protection: ProtectionSettings,
}

impl DemoSettings {
    /// Replaces values that would stall or spin a timer with their defaults.
    pub fn sanitized(mut self) -> Self {
        if self.sequencer.interval_ms == 0 {
            self.sequencer.interval_ms = DEFAULT_INTERVAL_MS;
        }
        if self.sequencer.tick_ms == 0 {
            self.sequencer.tick_ms = DEFAULT_TICK_MS;
        }
        if self.live.interval_ms == 0 {
            self.live.interval_ms = DEFAULT_LIVE_INTERVAL_MS;
        }
        if self.narration.words_per_minute == 0 {
            self.narration.words_per_minute = NarrationSettings::default().words_per_minute;
        }
        if self.protection.warning_ms == 0 {
            self.protection.warning_ms = DEFAULT_WARNING_MS;
        }
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            self.viewport = ViewportSettings::default();
        }
        self
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<DemoSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str::<DemoSettings>(&contents)
                .unwrap_or_else(|err| {
                    log::warn!("settings at {} unreadable ({err}); using defaults", path.display());
                    DemoSettings::default()
                })
                .sanitized()
        } else {
            DemoSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> DemoSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, settings: DemoSettings) -> Result<()> {
        let settings = settings.sanitized();
        self.persist(&settings)?;
        match self.data.write() {
            Ok(mut guard) => *guard = settings,
            Err(poisoned) => *poisoned.into_inner() = settings,
        }
        Ok(())
    }

    /// Remembers the live ticker's current on/off state for the next launch.
    pub fn remember_live_state(&self, live: &LiveSimulationTicker) -> Result<()> {
        let mut settings = self.get();
        settings.live.start_active = live.is_active();
        self.update(settings)
    }

    fn persist(&self, data: &DemoSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.get(), DemoSettings::default());
        assert_eq!(store.get().live.interval_ms, 5_000);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"sequencer":{"intervalMs":3000},"tour":{"autoStart":false}}"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().get();
        assert_eq!(settings.sequencer.interval_ms, 3000);
        assert_eq!(settings.sequencer.tick_ms, DEFAULT_TICK_MS);
        assert!(!settings.tour.auto_start);
        assert!(settings.narration.enabled);
    }

    #[test]
    fn zero_intervals_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"sequencer":{"intervalMs":0,"tickMs":0},"live":{"intervalMs":0}}"#)
            .unwrap();

        let settings = SettingsStore::new(path).unwrap().get();
        assert_eq!(settings.sequencer.interval_ms, DEFAULT_INTERVAL_MS);
        assert_eq!(settings.sequencer.tick_ms, DEFAULT_TICK_MS);
        assert_eq!(settings.live.interval_ms, DEFAULT_LIVE_INTERVAL_MS);
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(SettingsStore::new(path).unwrap().get(), DemoSettings::default());
    }

    #[test]
    fn update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        let mut settings = store.get();
        settings.narration.enabled = false;
        store.update(settings).unwrap();

        assert!(!SettingsStore::new(path).unwrap().get().narration.enabled);
    }
}
