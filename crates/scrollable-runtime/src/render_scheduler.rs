#![forbid(unsafe_code)]

//! Trailing-edge coalescing of render requests.
//!
//! Attribute changes and programmatic mutations arrive in bursts. Each
//! [`RenderScheduler::request`] restarts a single deferred pass `window`
//! after the latest request, so a burst collapses into one render. Leading
//! requests never run a pass of their own.
//!
//! # Ordering
//!
//! Passes on one scheduler never overlap: the pass closure runs from a host
//! timer callback, and the next pass cannot be scheduled to fire before the
//! current one returns. Whatever the pass does (render, refresh
//! subscriptions, re-arm observers) happens in the order the pass closure
//! sequences it.
//!
//! # Cancellation
//!
//! [`RenderScheduler::cancel`] discards the pending pass. It is idempotent
//! and safe to call with nothing pending.

use core::time::Duration;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use scrollable_core::TimerHost;

use crate::deferred::DeferredTask;

/// Default coalescing window.
pub const DEFAULT_COALESCING_WINDOW: Duration = Duration::from_millis(10);

/// Counters for scheduler activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerStats {
    /// Calls to [`RenderScheduler::request`].
    pub requests: u64,
    /// Requests that superseded a pending pass.
    pub coalesced: u64,
    /// Passes that actually ran (timer-driven or flushed).
    pub passes: u64,
    /// Pending passes discarded by [`RenderScheduler::cancel`].
    pub cancelled: u64,
}

#[derive(Debug, Default)]
struct SchedulerState {
    pending: Option<DeferredTask>,
    stats: SchedulerStats,
}

type Pass<R> = Rc<dyn Fn() -> R>;
type Outcome<R> = Rc<dyn Fn(R)>;

/// Debounces render requests into single deferred passes.
///
/// The pass returns `R`. Explicit runs ([`Self::flush`], [`Self::run_now`])
/// hand it back to the caller; timer-driven runs hand it to the sink set with
/// [`Self::on_deferred`], or drop it.
pub struct RenderScheduler<T: TimerHost + ?Sized + 'static, R: 'static = ()> {
    timers: Rc<T>,
    window: Duration,
    pass: Pass<R>,
    deferred: Outcome<R>,
    state: Rc<RefCell<SchedulerState>>,
}

impl<T: TimerHost + ?Sized + 'static, R: 'static> RenderScheduler<T, R> {
    /// Create a scheduler that runs `pass` on `timers` after `window` of quiet.
    pub fn new(timers: Rc<T>, window: Duration, pass: impl Fn() -> R + 'static) -> Self {
        Self {
            timers,
            window,
            pass: Rc::new(pass),
            deferred: Rc::new(|_: R| {}),
            state: Rc::new(RefCell::new(SchedulerState::default())),
        }
    }

    /// Receive the result of every timer-driven pass.
    #[must_use]
    pub fn on_deferred(mut self, sink: impl Fn(R) + 'static) -> Self {
        self.deferred = Rc::new(sink);
        self
    }

    /// Request a pass. Supersedes any pending one.
    pub fn request(&self) {
        let mut state = self.state.borrow_mut();
        state.stats.requests += 1;
        if let Some(previous) = state.pending.take() {
            previous.cancel(&*self.timers);
            state.stats.coalesced += 1;
            tracing::trace!(
                target: "scrollable.scheduler",
                coalesced = state.stats.coalesced,
                "Render request coalesced"
            );
        }

        let shared = Rc::clone(&self.state);
        let pass = Rc::clone(&self.pass);
        let deferred = Rc::clone(&self.deferred);
        let task = DeferredTask::schedule(&*self.timers, self.window, move || {
            let passes = {
                let mut state = shared.borrow_mut();
                state.pending = None;
                state.stats.passes += 1;
                state.stats.passes
            };
            tracing::debug!(target: "scrollable.scheduler", pass = passes, "Running render pass");
            deferred(pass());
        });
        state.pending = Some(task);
    }

    /// Discard the pending pass, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.borrow_mut();
        match state.pending.take() {
            Some(task) => {
                task.cancel(&*self.timers);
                state.stats.cancelled += 1;
                tracing::debug!(target: "scrollable.scheduler", "Pending render cancelled");
                true
            }
            None => false,
        }
    }

    /// Run the pending pass now instead of waiting for the window.
    ///
    /// Returns `None` (and runs nothing) if no pass was pending.
    pub fn flush(&self) -> Option<R> {
        let task = {
            let mut state = self.state.borrow_mut();
            let task = state.pending.take()?;
            state.stats.passes += 1;
            task
        };
        task.cancel(&*self.timers);
        tracing::debug!(target: "scrollable.scheduler", "Flushing render pass");
        Some((self.pass)())
    }

    /// Run the pass immediately, discarding anything pending.
    pub fn run_now(&self) -> R {
        {
            let mut state = self.state.borrow_mut();
            if let Some(task) = state.pending.take() {
                task.cancel(&*self.timers);
            }
            state.stats.passes += 1;
        }
        tracing::debug!(target: "scrollable.scheduler", "Running render pass now");
        (self.pass)()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.state.borrow().stats
    }
}

impl<T: TimerHost + ?Sized + 'static, R: 'static> fmt::Debug for RenderScheduler<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("RenderScheduler")
            .field("window", &self.window)
            .field("pending", &state.pending.is_some())
            .field("stats", &state.stats)
            .finish()
    }
}

impl<T: TimerHost + ?Sized + 'static, R: 'static> Drop for RenderScheduler<T, R> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut()
            && let Some(task) = state.pending.take()
        {
            task.cancel(&*self.timers);
        }
    }
}
