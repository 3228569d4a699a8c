use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::runtime::Handle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{sanitize_period, ScheduleHandle, Scheduler, TickCallback};

/// Runs each scheduled callback on its own tokio task.
#[derive(Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Binds to the runtime of the calling context.
    pub fn from_current() -> Result<Self> {
        let runtime =
            Handle::try_current().map_err(|err| anyhow!("no tokio runtime available: {err}"))?;
        Ok(Self::new(runtime))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, period: Duration, callback: TickCallback) -> ScheduleHandle {
        let period = sanitize_period(period);
        let token = CancellationToken::new();
        let task_token = token.clone();

        self.runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => callback(),
                }
            }
        });

        ScheduleHandle::new(token)
    }

    fn schedule_once(&self, delay: Duration, callback: TickCallback) -> ScheduleHandle {
        let token = CancellationToken::new();
        let task_token = token.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => {}
                _ = time::sleep(delay) => callback(),
            }
        });

        ScheduleHandle::new(token)
    }
}
