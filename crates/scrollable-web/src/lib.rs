#![forbid(unsafe_code)]

//! `scrollable-web` provides a deterministic, headless implementation of the
//! host traits in `scrollable-core`.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedder (or a test) simulates user input,
//!   layout changes, and the passage of time explicitly.
//! - **Deterministic time**: timers fire only when [`HeadlessDocument::advance`]
//!   moves the clock past their deadline.
//! - **Browser-shaped semantics**: native scroll and change events are queued
//!   and delivered on [`HeadlessDocument::flush_events`], like a frame tick;
//!   programmatic control-value writes never fire change events; shadow roots
//!   contain non-composed events.
//!
//! The crate does not bind to `wasm-bindgen`. A browser embedding implements
//! the same traits over `web-sys` and reuses the widget unchanged.

pub mod document;
pub mod patch;
pub mod stylesheets;

use core::time::Duration;

pub use document::{HeadlessDocument, MAX_EVENTS_PER_FLUSH};
pub use patch::DEFAULT_KEY_ATTRIBUTE;
pub use stylesheets::StylesheetStore;

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_clock_advances_monotonically() {
        let mut c = DeterministicClock::new();
        assert_eq!(c.now(), Duration::ZERO);

        c.advance(Duration::from_millis(10));
        assert_eq!(c.now(), Duration::from_millis(10));

        c.advance(Duration::from_millis(5));
        assert_eq!(c.now(), Duration::from_millis(15));

        // Saturation: don't panic or wrap.
        c.set(Duration::MAX);
        c.advance(Duration::from_secs(1));
        assert_eq!(c.now(), Duration::MAX);
    }
}
