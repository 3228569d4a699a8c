//! In-process event fan-out between the coordinator and its collaborators.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::views::ViewId;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ViewChangeReason {
    /// The sequencer's progress reached 100%.
    Auto,
    /// next/prev/select from a button or shortcut.
    Manual,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DashboardEvent {
    #[serde(rename_all = "camelCase")]
    ViewChanged {
        view_id: ViewId,
        index: usize,
        reason: ViewChangeReason,
    },
    #[serde(rename_all = "camelCase")]
    DemoToggled { is_running: bool },
    #[serde(rename_all = "camelCase")]
    LiveUpdated { update_count: u64 },
    #[serde(rename_all = "camelCase")]
    LiveToggled { is_active: bool },
    #[serde(rename_all = "camelCase")]
    TourStepChanged { step_index: usize, total_steps: usize },
    TourEnded,
    #[serde(rename_all = "camelCase")]
    NarrationChanged { is_narrating: bool },
    #[serde(rename_all = "camelCase")]
    PrintBlocked { warning_visible: bool },
}

type Listener = Arc<dyn Fn(&DashboardEvent) + Send + Sync>;

/// Synchronous broadcaster. Listeners run on the emitting thread, after
/// the emitter has released its own state lock.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&DashboardEvent) + Send + Sync + 'static,
    {
        let mut guard = match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(Arc::new(listener));
    }

    /// Convenience for the renderer contract: only view changes.
    pub fn on_view_change<F>(&self, listener: F)
    where
        F: Fn(ViewId) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let DashboardEvent::ViewChanged { view_id, .. } = event {
                listener(*view_id);
            }
        });
    }

    /// Drops every listener.
    pub fn clear(&self) {
        match self.listeners.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    pub fn emit(&self, event: DashboardEvent) {
        let listeners: Vec<Listener> = match self.listeners.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for listener in listeners {
            listener(&event);
        }
    }
}
