//! Global keyboard shortcuts.
//!
//! Key ownership, highest first: the guided tour while it runs, then a
//! focused text field, then the global shortcuts. The print shortcut is
//! the one exception and is always intercepted.

use serde::{Deserialize, Serialize};

use crate::tour::TourAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    Digit(u8),
    ArrowLeft,
    ArrowRight,
    Enter,
    Escape,
    Other,
}

impl Key {
    /// Parses a DOM `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Key {
        match name {
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "Enter" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => match c.to_digit(10) {
                        Some(d) => Key::Digit(d as u8),
                        None => Key::Char(c),
                    },
                    _ => Key::Other,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FocusTarget {
    #[default]
    Document,
    /// An input, textarea or contenteditable element has focus.
    TextInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub ctrl: bool,
    /// Cmd on macOS.
    pub meta: bool,
    pub focus: FocusTarget,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            focus: FocusTarget::Document,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.focus = FocusTarget::TextInput;
        self
    }

    fn has_command_modifier(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    SelectView(usize),
    PrevView,
    NextView,
    ToggleDemo,
    ToggleLive,
    /// Ctrl/Cmd+P, replaced by the in-app warning overlay.
    Print,
    Tour(TourAction),
}

impl ShortcutAction {
    /// Label recorded in the session log.
    pub fn label(&self) -> String {
        match self {
            ShortcutAction::SelectView(index) => format!("select_view_{}", index + 1),
            ShortcutAction::PrevView => "prev_view".into(),
            ShortcutAction::NextView => "next_view".into(),
            ShortcutAction::ToggleDemo => "toggle_demo".into(),
            ShortcutAction::ToggleLive => "toggle_live".into(),
            ShortcutAction::Print => "print_attempt".into(),
            ShortcutAction::Tour(TourAction::Next) => "tour_next".into(),
            ShortcutAction::Tour(TourAction::Prev) => "tour_prev".into(),
            ShortcutAction::Tour(TourAction::End) => "tour_end".into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeyboardShortcutRouter {
    view_count: usize,
}

impl KeyboardShortcutRouter {
    pub fn new(view_count: usize) -> Self {
        Self { view_count }
    }

    pub fn route(&self, event: &KeyEvent, tour_active: bool) -> Option<ShortcutAction> {
        if event.has_command_modifier() && matches!(event.key, Key::Char('p' | 'P')) {
            return Some(ShortcutAction::Print);
        }

        if tour_active {
            return TourAction::from_key(event).map(ShortcutAction::Tour);
        }

        if event.focus == FocusTarget::TextInput || event.has_command_modifier() {
            return None;
        }

        match event.key {
            Key::Digit(d) if d >= 1 && (d as usize) <= self.view_count => {
                Some(ShortcutAction::SelectView(d as usize - 1))
            }
            Key::ArrowLeft => Some(ShortcutAction::PrevView),
            Key::ArrowRight => Some(ShortcutAction::NextView),
            Key::Char('d' | 'D') => Some(ShortcutAction::ToggleDemo),
            Key::Char('l' | 'L') => Some(ShortcutAction::ToggleLive),
            _ => None,
        }
    }
}
