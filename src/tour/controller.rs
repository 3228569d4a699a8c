use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::keyboard::{Key, KeyEvent};
use crate::storage::PersistentStore;

use super::geometry::{Point, Rect, Size};
use super::placement::{place_tooltip, spotlight_rect, TOOLTIP_PADDING};
use super::steps::TourStep;

const ENABLE_LOGS: bool = true;
use crate::{log_debug, log_warn};

/// Storage key for the "tour already seen" flag.
pub const TOUR_COMPLETED_KEY: &str = "vitasignal_tour_completed";

/// Resolves a step's selector to the element's current on-screen box.
pub trait TargetLocator: Send + Sync {
    fn query_target(&self, selector: &str) -> Option<Rect>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TourState {
    pub is_active: bool,
    pub current_step_index: usize,
    /// Derived from the current step's selector; recomputed on every step
    /// change and resize, `None` when the element could not be found.
    pub target_rect: Option<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourAction {
    Next,
    Prev,
    End,
}

impl TourAction {
    /// Keys the tour claims while it is active.
    pub fn from_key(event: &KeyEvent) -> Option<Self> {
        match event.key {
            Key::Escape => Some(TourAction::End),
            Key::ArrowRight | Key::Enter => Some(TourAction::Next),
            Key::ArrowLeft => Some(TourAction::Prev),
            _ => None,
        }
    }
}

pub struct GuidedTourController {
    steps: Vec<TourStep>,
    state: TourState,
    viewport: Size,
    locator: Arc<dyn TargetLocator>,
    store: Arc<dyn PersistentStore>,
}

impl GuidedTourController {
    pub fn new(
        steps: Vec<TourStep>,
        viewport: Size,
        locator: Arc<dyn TargetLocator>,
        store: Arc<dyn PersistentStore>,
    ) -> Self {
        Self {
            steps,
            state: TourState::default(),
            viewport,
            locator,
            store,
        }
    }

    pub fn state(&self) -> &TourState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn current_step(&self) -> Option<&TourStep> {
        if !self.state.is_active {
            return None;
        }
        self.steps.get(self.state.current_step_index)
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step_index + 1 >= self.steps.len()
    }

    /// Enters step 0. Ignored for an empty tour.
    pub fn start_tour(&mut self) {
        if self.steps.is_empty() {
            return;
        }
        self.state.is_active = true;
        self.enter_step(0);
    }

    /// Moves forward; on the last step this finishes the tour.
    /// Returns whether the tour is still active.
    pub fn next_step(&mut self) -> bool {
        if !self.state.is_active {
            return false;
        }
        if self.is_last_step() {
            self.end_tour();
            return false;
        }
        self.enter_step(self.state.current_step_index + 1);
        true
    }

    pub fn prev_step(&mut self) {
        if !self.state.is_active {
            return;
        }
        self.enter_step(self.state.current_step_index.saturating_sub(1));
    }

    /// Jumps to `index`, clamped into the step range.
    pub fn go_to_step(&mut self, index: usize) {
        if !self.state.is_active || self.steps.is_empty() {
            return;
        }
        self.enter_step(index.min(self.steps.len() - 1));
    }

    /// Leaves the tour and remembers that it was seen.
    pub fn end_tour(&mut self) {
        if !self.state.is_active {
            return;
        }
        self.state = TourState::default();
        if let Err(err) = self.store.save(TOUR_COMPLETED_KEY, "true") {
            log_warn!("could not persist tour completion: {err:#}");
        }
    }

    pub fn has_completed(&self) -> bool {
        match self.store.load(TOUR_COMPLETED_KEY) {
            Ok(value) => value.is_some(),
            Err(err) => {
                log_warn!("could not read tour completion flag: {err:#}");
                false
            }
        }
    }

    pub fn should_auto_start(&self) -> bool {
        !self.steps.is_empty() && !self.has_completed()
    }

    pub fn reset_tour_history(&self) {
        if let Err(err) = self.store.clear(TOUR_COMPLETED_KEY) {
            log_warn!("could not reset tour history: {err:#}");
        }
    }

    /// Applies a tour key. Returns true when the key was consumed.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if !self.state.is_active {
            return false;
        }
        match TourAction::from_key(event) {
            Some(action) => {
                self.apply(action);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, action: TourAction) {
        match action {
            TourAction::Next => {
                self.next_step();
            }
            TourAction::Prev => self.prev_step(),
            TourAction::End => self.end_tour(),
        }
    }

    pub fn on_resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        if self.state.is_active {
            self.refresh_target();
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Where the tooltip for the current step goes, if the tour is active.
    pub fn tooltip_position(&self, tooltip: Size) -> Option<Point> {
        let step = self.current_step()?;
        Some(place_tooltip(
            self.state.target_rect.as_ref(),
            step.position,
            tooltip,
            self.viewport,
            TOOLTIP_PADDING,
        ))
    }

    pub fn spotlight(&self) -> Option<Rect> {
        let step = self.current_step()?;
        if !step.spotlight {
            return None;
        }
        self.state
            .target_rect
            .as_ref()
            .map(|rect| spotlight_rect(rect, TOOLTIP_PADDING))
    }

    fn enter_step(&mut self, index: usize) {
        self.state.current_step_index = index;
        self.refresh_target();
    }

    fn refresh_target(&mut self) {
        let Some(step) = self.steps.get(self.state.current_step_index) else {
            self.state.target_rect = None;
            return;
        };
        self.state.target_rect = self.locator.query_target(&step.target_selector);
        if self.state.target_rect.is_none() {
            log_debug!(
                "tour target {} not found; centering tooltip",
                step.target_selector
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::tour::steps::default_tour;
    use crate::tour::TooltipPosition;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakePage {
        rects: Mutex<HashMap<String, Rect>>,
    }

    impl TargetLocator for FakePage {
        fn query_target(&self, selector: &str) -> Option<Rect> {
            self.rects.lock().unwrap().get(selector).copied()
        }
    }

    fn tour() -> (Arc<FakePage>, Arc<MemoryStore>, GuidedTourController) {
        let page = Arc::new(FakePage::default());
        let store = Arc::new(MemoryStore::new());
        let controller = GuidedTourController::new(
            default_tour(),
            Size::new(1440.0, 900.0),
            page.clone(),
            store.clone(),
        );
        (page, store, controller)
    }

    #[test]
    fn start_then_end_leaves_inactive() {
        let (_page, _store, mut tour) = tour();
        tour.start_tour();
        assert!(tour.is_active());
        tour.end_tour();
        assert!(!tour.is_active());
        assert!(tour.current_step().is_none());
    }

    #[test]
    fn go_to_step_clamps() {
        let (_page, _store, mut tour) = tour();
        tour.start_tour();
        tour.go_to_step(99);
        assert_eq!(tour.state().current_step_index, tour.total_steps() - 1);
        tour.go_to_step(0);
        tour.prev_step();
        assert_eq!(tour.state().current_step_index, 0);
    }

    #[test]
    fn next_on_last_step_finishes() {
        let (_page, _store, mut tour) = tour();
        tour.start_tour();
        for _ in 1..tour.total_steps() {
            assert!(tour.next_step());
        }
        assert!(tour.is_last_step());
        assert!(!tour.next_step());
        assert!(!tour.is_active());
        assert!(tour.has_completed());
    }

    #[test]
    fn completion_blocks_auto_start_until_reset() {
        let (_page, store, mut tour) = tour();
        assert!(tour.should_auto_start());
        tour.start_tour();
        tour.end_tour();
        assert!(!tour.should_auto_start());
        assert!(store.load(TOUR_COMPLETED_KEY).unwrap().is_some());

        tour.reset_tour_history();
        assert!(tour.should_auto_start());
    }

    #[test]
    fn missing_target_falls_back_to_center() {
        let (_page, _store, mut tour) = tour();
        tour.start_tour();
        assert!(tour.state().target_rect.is_none());
        let point = tour.tooltip_position(Size::new(300.0, 200.0)).unwrap();
        assert_eq!(point.left, 570.0);
        assert_eq!(point.top, 350.0);
        assert!(tour.spotlight().is_none());
    }

    #[test]
    fn target_is_recomputed_on_step_change_and_resize() {
        let (page, _store, mut tour) = tour();
        let tabs = Rect::new(100.0, 80.0, 600.0, 48.0);
        page.rects
            .lock()
            .unwrap()
            .insert("[data-tour='view-tabs']".into(), tabs);

        tour.start_tour();
        assert!(tour.state().target_rect.is_none());
        tour.next_step();
        assert_eq!(tour.state().target_rect, Some(tabs));
        assert!(tour.spotlight().is_some());

        let moved = Rect::new(20.0, 80.0, 400.0, 48.0);
        page.rects
            .lock()
            .unwrap()
            .insert("[data-tour='view-tabs']".into(), moved);
        tour.on_resize(Size::new(800.0, 600.0));
        assert_eq!(tour.state().target_rect, Some(moved));
        assert_eq!(tour.current_step().unwrap().position, TooltipPosition::Bottom);
    }

    #[test]
    fn keys_drive_the_tour_only_while_active() {
        let (_page, _store, mut tour) = tour();
        assert!(!tour.handle_key(&KeyEvent::plain(Key::ArrowRight)));

        tour.start_tour();
        assert!(tour.handle_key(&KeyEvent::plain(Key::Enter)));
        assert_eq!(tour.state().current_step_index, 1);
        assert!(tour.handle_key(&KeyEvent::plain(Key::ArrowLeft)));
        assert_eq!(tour.state().current_step_index, 0);
        assert!(!tour.handle_key(&KeyEvent::plain(Key::Char('d'))));
        assert!(tour.handle_key(&KeyEvent::plain(Key::Escape)));
        assert!(!tour.is_active());
    }
}
