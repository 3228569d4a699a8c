//! Terminal host: stands in for the browser page around the coordinator.

use std::collections::HashMap;

use crate::keyboard::{Key, KeyEvent};
use crate::tour::{Rect, TargetLocator};

/// Fixed page layout used to resolve tour selectors headlessly.
pub struct StaticLayout {
    rects: HashMap<String, Rect>,
}

impl StaticLayout {
    pub fn new(rects: HashMap<String, Rect>) -> Self {
        Self { rects }
    }

    /// Layout of the standard dashboard at 1440x900.
    pub fn standard() -> Self {
        let rects = [
            ("[data-tour='header']", Rect::new(0.0, 0.0, 1440.0, 64.0)),
            ("[data-tour='view-tabs']", Rect::new(24.0, 72.0, 640.0, 44.0)),
            ("[data-tour='risk-cards']", Rect::new(24.0, 140.0, 420.0, 600.0)),
            ("[data-tour='shap-chart']", Rect::new(920.0, 140.0, 496.0, 360.0)),
            ("[data-tour='demo-controls']", Rect::new(1100.0, 820.0, 316.0, 56.0)),
        ]
        .into_iter()
        .map(|(selector, rect)| (selector.to_string(), rect))
        .collect();
        Self::new(rects)
    }
}

impl TargetLocator for StaticLayout {
    fn query_target(&self, selector: &str) -> Option<Rect> {
        self.rects.get(selector).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    Key(KeyEvent),
    Help,
    Quit,
    Stats,
    ClearHistory,
    StartTour,
    ResetTour,
    Speed(u64),
    Narration(bool),
    Status,
    Unknown(String),
}

/// Parses one line typed at the terminal.
///
/// Bare key names (`d`, `3`, `ArrowLeft`) and the shorthands `left`,
/// `right`, `esc` and `^p` become key presses; an empty line is Enter.
pub fn parse_command(line: &str) -> HostCommand {
    let line = line.trim();
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or("");
    let arg = parts.next();

    match (head.to_ascii_lowercase().as_str(), arg) {
        ("", _) => HostCommand::Key(KeyEvent::plain(Key::Enter)),
        ("q" | "quit" | "exit", _) => HostCommand::Quit,
        ("?" | "help", _) => HostCommand::Help,
        ("stats", _) => HostCommand::Stats,
        ("status", _) => HostCommand::Status,
        ("clear", _) => HostCommand::ClearHistory,
        ("tour", _) => HostCommand::StartTour,
        ("reset-tour", _) => HostCommand::ResetTour,
        ("speed", Some(ms)) => match ms.parse() {
            Ok(ms) => HostCommand::Speed(ms),
            Err(_) => HostCommand::Unknown(line.to_string()),
        },
        ("narration", Some("on")) => HostCommand::Narration(true),
        ("narration", Some("off")) => HostCommand::Narration(false),
        ("left", None) => HostCommand::Key(KeyEvent::plain(Key::ArrowLeft)),
        ("right", None) => HostCommand::Key(KeyEvent::plain(Key::ArrowRight)),
        ("esc", None) => HostCommand::Key(KeyEvent::plain(Key::Escape)),
        ("^p", None) => HostCommand::Key(KeyEvent::plain(Key::Char('p')).with_ctrl()),
        (_, None) => match Key::from_name(head) {
            Key::Other => HostCommand::Unknown(line.to_string()),
            key => HostCommand::Key(KeyEvent::plain(key)),
        },
        _ => HostCommand::Unknown(line.to_string()),
    }
}

pub const HELP: &str = "\
keys:     1-4 select view | left/right prev/next | d auto-demo | l live feed | ^p print
tour:     tour | enter/right next | left back | esc end | reset-tour
commands: speed <ms> | narration on|off | status | stats | clear | help | quit";
