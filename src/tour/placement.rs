use super::geometry::{Point, Rect, Size};
use super::steps::TooltipPosition;

/// Gap between target and tooltip, and minimum distance to the viewport edge.
pub const TOOLTIP_PADDING: f64 = 16.0;

/// Computes the tooltip's top-left corner.
///
/// Without a target the tooltip is centered in the viewport. With one, it
/// sits on the requested side and is then clamped so it never leaves the
/// viewport: each axis ends up in `[padding, viewport - tooltip - padding]`,
/// or centered when the viewport is too small for that range.
pub fn place_tooltip(
    target: Option<&Rect>,
    position: TooltipPosition,
    tooltip: Size,
    viewport: Size,
    padding: f64,
) -> Point {
    let Some(target) = target else {
        return Point {
            top: center(viewport.height, tooltip.height),
            left: center(viewport.width, tooltip.width),
        };
    };

    let (top, left) = match position {
        TooltipPosition::Top => (
            target.y - tooltip.height - padding,
            target.center_x() - tooltip.width / 2.0,
        ),
        TooltipPosition::Bottom => (
            target.bottom() + padding,
            target.center_x() - tooltip.width / 2.0,
        ),
        TooltipPosition::Left => (
            target.center_y() - tooltip.height / 2.0,
            target.x - tooltip.width - padding,
        ),
        TooltipPosition::Right => (
            target.center_y() - tooltip.height / 2.0,
            target.right() + padding,
        ),
    };

    Point {
        top: clamp_axis(top, tooltip.height, viewport.height, padding),
        left: clamp_axis(left, tooltip.width, viewport.width, padding),
    }
}

/// Highlight box drawn around a spotlighted target.
pub fn spotlight_rect(target: &Rect, padding: f64) -> Rect {
    target.inflate(padding / 2.0)
}

fn clamp_axis(value: f64, extent: f64, viewport: f64, padding: f64) -> f64 {
    let min = padding;
    let max = viewport - extent - padding;
    if max < min {
        return center(viewport, extent);
    }
    value.clamp(min, max)
}

fn center(viewport: f64, extent: f64) -> f64 {
    ((viewport - extent) / 2.0).max(0.0)
}
