#![forbid(unsafe_code)]

//! Cancellable single-shot deferred tasks.

use core::time::Duration;

use scrollable_core::{TimerHost, TimerId};

use crate::cancellation::CancellationSource;

/// A task scheduled to run once on a [`TimerHost`] after a delay.
///
/// Cancellation clears the host timer and also flips a token the task
/// checks before running, so a cancelled task never runs even if the host
/// already dequeued its timer.
#[derive(Debug)]
pub struct DeferredTask {
    timer: TimerId,
    source: CancellationSource,
}

impl DeferredTask {
    /// Schedule `task` to run after `delay`.
    pub fn schedule<T>(timers: &T, delay: Duration, task: impl FnOnce() + 'static) -> Self
    where
        T: TimerHost + ?Sized,
    {
        let source = CancellationSource::new();
        let token = source.token();
        let timer = timers.set_timeout(
            delay,
            Box::new(move || {
                if token.is_cancelled() {
                    tracing::trace!(target: "scrollable.scheduler", "Skipping cancelled task");
                    return;
                }
                task();
            }),
        );
        Self { timer, source }
    }

    /// Cancel the task. Idempotent; harmless after the task ran.
    pub fn cancel<T>(&self, timers: &T)
    where
        T: TimerHost + ?Sized,
    {
        if self.source.is_cancelled() {
            return;
        }
        self.source.cancel();
        timers.clear_timeout(self.timer);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.source.is_cancelled()
    }

    /// The host timer backing this task.
    #[must_use]
    pub const fn timer(&self) -> TimerId {
        self.timer
    }
}
