//! Screen-protection overlay: the print interception warning and the
//! watermark label stamped over every view.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use crate::events::{DashboardEvent, EventBus};
use crate::scheduler::{ScheduleHandle, Scheduler};

pub const DEFAULT_WARNING_MS: u64 = 3_000;

#[derive(Default)]
struct ProtectionState {
    warning_visible: bool,
    blocked_attempts: u32,
    watermark: String,
    hide_timer: Option<ScheduleHandle>,
    /// Bumped each time the warning is shown; a hide timer only acts on its own showing.
    showing: u64,
}

struct ProtectionInner {
    state: Mutex<ProtectionState>,
    scheduler: Arc<dyn Scheduler>,
    events: EventBus,
    warning: Duration,
}

#[derive(Clone)]
pub struct ScreenProtection {
    inner: Arc<ProtectionInner>,
}

impl ScreenProtection {
    pub fn new(scheduler: Arc<dyn Scheduler>, events: EventBus, warning_ms: u64) -> Self {
        Self {
            inner: Arc::new(ProtectionInner {
                state: Mutex::new(ProtectionState {
                    watermark: watermark_for(None),
                    ..ProtectionState::default()
                }),
                scheduler,
                events,
                warning: Duration::from_millis(warning_ms),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ProtectionState> {
        lock(&self.inner.state)
    }

    pub fn warning_visible(&self) -> bool {
        self.state().warning_visible
    }

    pub fn blocked_attempts(&self) -> u32 {
        self.state().blocked_attempts
    }

    pub fn watermark(&self) -> String {
        self.state().watermark.clone()
    }

    pub fn set_session(&self, session_id: Option<&str>) {
        self.state().watermark = watermark_for(session_id);
    }

    /// Shows the "printing disabled" overlay in place of the host print
    /// dialog. A repeated attempt restarts the auto-hide countdown.
    pub fn block_print(&self) {
        {
            let mut state = self.state();
            state.showing = state.showing.wrapping_add(1);
            state.warning_visible = true;
            state.blocked_attempts = state.blocked_attempts.saturating_add(1);

            let showing = state.showing;
            let weak: Weak<ProtectionInner> = Arc::downgrade(&self.inner);
            state.hide_timer = Some(self.inner.scheduler.schedule_once(
                self.inner.warning,
                Arc::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        ScreenProtection { inner }.expire(showing);
                    }
                }),
            ));
        }
        log::warn!("print attempt blocked");
        self.inner.events.emit(DashboardEvent::PrintBlocked {
            warning_visible: true,
        });
    }

    pub fn dismiss(&self) {
        self.hide(None);
    }

    fn expire(&self, showing: u64) {
        self.hide(Some(showing));
    }

    fn hide(&self, showing: Option<u64>) {
        let handle = {
            let mut state = self.state();
            if !state.warning_visible || showing.is_some_and(|id| id != state.showing) {
                return;
            }
            state.warning_visible = false;
            state.hide_timer.take()
        };
        drop(handle);
        self.inner.events.emit(DashboardEvent::PrintBlocked {
            warning_visible: false,
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn watermark_for(session_id: Option<&str>) -> String {
    match session_id {
        Some(id) => {
            let short: String = id.chars().take(8).collect();
            format!("CONFIDENTIAL • {short}")
        }
        None => "CONFIDENTIAL".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;

    fn protection() -> (Arc<ManualScheduler>, ScreenProtection) {
        let scheduler = Arc::new(ManualScheduler::new());
        let protection = ScreenProtection::new(scheduler.clone(), EventBus::new(), 3_000);
        (scheduler, protection)
    }

    #[test]
    fn warning_hides_itself() {
        let (scheduler, protection) = protection();
        protection.block_print();
        assert!(protection.warning_visible());

        scheduler.advance_ms(2_999);
        assert!(protection.warning_visible());
        scheduler.advance_ms(1);
        assert!(!protection.warning_visible());
    }

    #[test]
    fn repeated_attempt_restarts_countdown() {
        let (scheduler, protection) = protection();
        protection.block_print();
        scheduler.advance_ms(2_000);
        protection.block_print();
        scheduler.advance_ms(2_000);
        assert!(protection.warning_visible());
        scheduler.advance_ms(1_000);
        assert!(!protection.warning_visible());
        assert_eq!(protection.blocked_attempts(), 2);
    }

    #[test]
    fn dismiss_cancels_pending_hide() {
        let (scheduler, protection) = protection();
        protection.block_print();
        protection.dismiss();
        assert!(!protection.warning_visible());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn stale_hide_timer_leaves_new_warning_up() {
        let (scheduler, protection) = protection();
        protection.block_print();
        let first = protection.state().showing;
        protection.block_print();

        protection.expire(first);
        assert!(protection.warning_visible());
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance_ms(3_000);
        assert!(!protection.warning_visible());
    }

    #[test]
    fn watermark_uses_short_session_id() {
        let (_scheduler, protection) = protection();
        assert_eq!(protection.watermark(), "CONFIDENTIAL");
        protection.set_session(Some("0123456789abcdef"));
        assert_eq!(protection.watermark(), "CONFIDENTIAL • 01234567");
    }
}
