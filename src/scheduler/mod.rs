//! Timer abstraction shared by every periodic component.
//!
//! Components never touch a clock directly. They ask a [`Scheduler`] for a
//! repeating or one-shot callback and keep the returned [`ScheduleHandle`];
//! dropping or cancelling the handle stops the callback. The host uses
//! [`TokioScheduler`], tests use [`ManualScheduler`].

pub mod manual;
pub mod tokio_scheduler;

pub use manual::ManualScheduler;
pub use tokio_scheduler::TokioScheduler;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub type TickCallback = Arc<dyn Fn() + Send + Sync + 'static>;

pub trait Scheduler: Send + Sync {
    /// Calls `callback` every `period`. The first call happens one full
    /// period after scheduling, never immediately.
    fn schedule_repeating(&self, period: Duration, callback: TickCallback) -> ScheduleHandle;

    /// Calls `callback` once after `delay`.
    fn schedule_once(&self, delay: Duration, callback: TickCallback) -> ScheduleHandle;
}

/// Cancel token for a scheduled callback. Cancels on drop.
#[derive(Debug)]
pub struct ScheduleHandle {
    token: CancellationToken,
}

impl ScheduleHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Zero periods would spin the fake clock forever.
pub(crate) fn sanitize_period(period: Duration) -> Duration {
    period.max(Duration::from_millis(1))
}
