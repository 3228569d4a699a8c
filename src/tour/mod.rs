//! Guided onboarding walkthrough.
//!
//! The controller never touches the page directly: targets are resolved
//! through a [`TargetLocator`] and tooltip placement is a pure function of
//! rectangles, so the whole walkthrough runs headless.

pub mod controller;
pub mod geometry;
pub mod placement;
pub mod steps;

pub use controller::{GuidedTourController, TargetLocator, TourAction, TourState, TOUR_COMPLETED_KEY};
pub use geometry::{Point, Rect, Size};
pub use placement::{place_tooltip, spotlight_rect, TOOLTIP_PADDING};
pub use steps::{default_tour, TooltipPosition, TourStep};
