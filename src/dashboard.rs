//! Wires the coordinator components together.
//!
//! Each component owns its own state; this layer only carries the
//! contracts between them: view changes fan out to narration and the
//! session log, the tour pauses the auto-demo while it runs, and keyboard
//! shortcuts are routed to whoever owns the key.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::events::{DashboardEvent, EventBus};
use crate::keyboard::{KeyEvent, KeyboardShortcutRouter, ShortcutAction};
use crate::live::{LiveSimulationState, LiveSimulationTicker};
use crate::narration::{NarrationCoordinator, SpeechBackend};
use crate::protection::ScreenProtection;
use crate::scheduler::Scheduler;
use crate::sequencer::{AutoDemoSequencer, SequencerSnapshot, SpeedPreset};
use crate::sessions::{SessionEventType, SessionStats, SessionTracker};
use crate::settings::DemoSettings;
use crate::storage::PersistentStore;
use crate::tour::{
    default_tour, GuidedTourController, Point, Rect, Size, TargetLocator, TourAction, TourState,
    TourStep,
};
use crate::views::{RenderContext, RenderTable, ViewRegistry};

/// Host capabilities the dashboard runs on.
pub struct DashboardHost {
    pub scheduler: Arc<dyn Scheduler>,
    pub store: Arc<dyn PersistentStore>,
    pub speech: Arc<dyn SpeechBackend>,
    pub locator: Arc<dyn TargetLocator>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub sequencer: SequencerSnapshot,
    pub live: LiveSimulationState,
    pub tour: TourState,
    pub is_narrating: bool,
    pub print_warning_visible: bool,
    pub watermark: String,
}

pub struct Dashboard {
    events: EventBus,
    registry: Arc<ViewRegistry>,
    sequencer: AutoDemoSequencer,
    live: LiveSimulationTicker,
    narration: NarrationCoordinator,
    tour: Mutex<GuidedTourController>,
    router: KeyboardShortcutRouter,
    protection: ScreenProtection,
    sessions: SessionTracker,
    settings: DemoSettings,
    resume_after_tour: AtomicBool,
}

impl Dashboard {
    pub fn new(settings: DemoSettings, host: DashboardHost) -> Self {
        let settings = settings.sanitized();
        let events = EventBus::new();
        let registry = Arc::new(ViewRegistry::standard());

        let sequencer = AutoDemoSequencer::new(
            registry.clone(),
            host.scheduler.clone(),
            events.clone(),
            settings.sequencer.interval_ms,
            settings.sequencer.tick_ms,
        );
        let live = LiveSimulationTicker::new(
            host.scheduler.clone(),
            events.clone(),
            Duration::from_millis(settings.live.interval_ms),
            settings.live.seed,
        );
        let narration =
            NarrationCoordinator::new(host.speech, events.clone(), settings.narration.enabled);
        let tour = GuidedTourController::new(
            default_tour(),
            Size::new(settings.viewport.width, settings.viewport.height),
            host.locator,
            host.store.clone(),
        );
        let protection = ScreenProtection::new(
            host.scheduler,
            events.clone(),
            settings.protection.warning_ms,
        );
        let sessions = SessionTracker::new(host.store);

        let dashboard = Self {
            router: KeyboardShortcutRouter::new(registry.len()),
            events,
            registry,
            sequencer,
            live,
            narration,
            tour: Mutex::new(tour),
            protection,
            sessions,
            settings,
            resume_after_tour: AtomicBool::new(false),
        };
        dashboard.wire_view_changes();
        dashboard
    }

    fn wire_view_changes(&self) {
        let demo_running = Arc::new(AtomicBool::new(false));
        let narration = self.narration.clone();
        let sessions = self.sessions.clone();
        let registry = self.registry.clone();

        self.events.subscribe(move |event| match event {
            DashboardEvent::DemoToggled { is_running } => {
                demo_running.store(*is_running, Ordering::SeqCst);
                if !is_running {
                    narration.stop();
                }
            }
            DashboardEvent::ViewChanged { index, .. } => {
                let Some(view) = registry.get(*index) else {
                    return;
                };
                if demo_running.load(Ordering::SeqCst) {
                    narration.narrate_view(view);
                }
                sessions.append(SessionEventType::PageView, view.label, Some(view.id.route()));
            }
            _ => {}
        });
    }

    fn tour(&self) -> MutexGuard<'_, GuidedTourController> {
        match self.tour.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn sequencer(&self) -> &AutoDemoSequencer {
        &self.sequencer
    }

    pub fn live(&self) -> &LiveSimulationTicker {
        &self.live
    }

    pub fn narration(&self) -> &NarrationCoordinator {
        &self.narration
    }

    pub fn protection(&self) -> &ScreenProtection {
        &self.protection
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    /// Opens the session log and applies the launch-time settings.
    pub fn start(&self) -> String {
        let session_id = self.sessions.start_session();
        self.protection.set_session(Some(&session_id));

        if self.settings.live.start_active {
            self.live.start();
        }
        if self.settings.tour.auto_start && self.tour().should_auto_start() {
            self.start_tour();
        }
        session_id
    }

    /// Stops every timer, closes the session and drops all listeners.
    pub fn shutdown(&self) {
        self.sequencer.pause();
        self.live.stop();
        self.narration.stop();
        self.protection.dismiss();
        self.sessions.end_session();
        self.events.clear();
    }

    pub fn toggle_demo(&self) -> bool {
        if self.sequencer.is_running() {
            self.sequencer.pause();
            false
        } else {
            self.play_demo();
            true
        }
    }

    /// Starts playback and reads the current view aloud.
    fn play_demo(&self) {
        self.sequencer.play();
        if let Some(view) = self.registry.get(self.sequencer.current_index()) {
            self.narration.narrate_view(view);
        }
    }

    pub fn next_view(&self) {
        self.sequencer.next_view();
    }

    pub fn prev_view(&self) {
        self.sequencer.prev_view();
    }

    pub fn select_view(&self, index: usize) {
        self.sequencer.select_view(index);
    }

    pub fn set_speed(&self, interval_ms: u64) -> Result<()> {
        self.sequencer.set_speed(interval_ms)
    }

    pub fn set_speed_preset(&self, preset: SpeedPreset) {
        self.sequencer.set_speed_preset(preset);
    }

    pub fn toggle_live(&self) -> bool {
        self.live.toggle()
    }

    pub fn update_live(&self) -> u64 {
        self.live.update_simulation()
    }

    pub fn tour_state(&self) -> TourState {
        self.tour().state().clone()
    }

    pub fn current_tour_step(&self) -> Option<TourStep> {
        self.tour().current_step().cloned()
    }

    /// Starts the walkthrough. A running auto-demo is paused for its
    /// duration and resumed when the tour ends.
    pub fn start_tour(&self) {
        if self.tour().is_active() {
            return;
        }
        if self.sequencer.is_running() {
            self.sequencer.pause();
            self.resume_after_tour.store(true, Ordering::SeqCst);
        }
        self.tour().start_tour();
        self.sessions
            .append(SessionEventType::FeatureUse, "guided_tour_started", None);
        self.after_tour_change();
    }

    pub fn tour_action(&self, action: TourAction) {
        if !self.tour().is_active() {
            return;
        }
        self.tour().apply(action);
        self.after_tour_change();
    }

    pub fn go_to_tour_step(&self, index: usize) {
        if !self.tour().is_active() {
            return;
        }
        self.tour().go_to_step(index);
        self.after_tour_change();
    }

    pub fn reset_tour_history(&self) {
        self.tour().reset_tour_history();
    }

    pub fn tooltip_position(&self, tooltip: Size) -> Option<Point> {
        self.tour().tooltip_position(tooltip)
    }

    pub fn spotlight(&self) -> Option<Rect> {
        self.tour().spotlight()
    }

    pub fn resize(&self, viewport: Size) {
        self.tour().on_resize(viewport);
    }

    fn after_tour_change(&self) {
        let (active, step_index, total_steps) = {
            let tour = self.tour();
            (tour.is_active(), tour.state().current_step_index, tour.total_steps())
        };

        if active {
            self.events.emit(DashboardEvent::TourStepChanged {
                step_index,
                total_steps,
            });
            return;
        }

        self.events.emit(DashboardEvent::TourEnded);
        if self.resume_after_tour.swap(false, Ordering::SeqCst) {
            self.play_demo();
        }
    }

    /// Routes a key press and performs the resulting action, if any.
    pub fn handle_key(&self, event: &KeyEvent) -> Option<ShortcutAction> {
        let tour_active = self.tour().is_active();
        let action = self.router.route(event, tour_active)?;

        match action {
            ShortcutAction::SelectView(index) => self.select_view(index),
            ShortcutAction::PrevView => self.prev_view(),
            ShortcutAction::NextView => self.next_view(),
            ShortcutAction::ToggleDemo => {
                self.toggle_demo();
            }
            ShortcutAction::ToggleLive => {
                self.toggle_live();
            }
            ShortcutAction::Print => self.protection.block_print(),
            ShortcutAction::Tour(tour_action) => self.tour_action(tour_action),
        }

        let event_type = match action {
            ShortcutAction::Print | ShortcutAction::Tour(_) => SessionEventType::Interaction,
            _ => SessionEventType::FeatureUse,
        };
        self.sessions.append(event_type, &action.label(), None);
        Some(action)
    }

    pub fn session_stats(&self) -> SessionStats {
        self.sessions.stats()
    }

    pub fn clear_history(&self) {
        self.sessions.clear();
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            sequencer: self.sequencer.snapshot(),
            live: self.live.state(),
            tour: self.tour_state(),
            is_narrating: self.narration.is_narrating(),
            print_warning_visible: self.protection.warning_visible(),
            watermark: self.protection.watermark(),
        }
    }

    /// Renders the current view through `table`.
    pub fn render(&self, table: &RenderTable) -> Option<String> {
        let state = self.sequencer.state();
        let view = self.registry.get(state.current_index)?;
        let metrics = self.live.metrics();
        let watermark = self.protection.watermark();
        table.render(&RenderContext {
            view,
            metrics: &metrics,
            progress: state.progress,
            watermark: &watermark,
        })
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        // Listeners hold clones of components that hold the bus.
        self.events.clear();
    }
}
