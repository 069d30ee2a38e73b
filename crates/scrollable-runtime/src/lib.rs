#![forbid(unsafe_code)]

//! Runtime primitives for widgets whose nodes are rebuilt on every render.
//!
//! # Key Components
//!
//! - [`SubscriptionTracker`] - keeps attach/detach hooks bound to whatever
//!   node currently plays each role
//! - [`RenderScheduler`] - trailing-edge coalescing of render requests
//! - [`DeferredTask`] - cancellable single-shot task on a [`TimerHost`]
//! - [`CancellationSource`] / [`CancellationToken`] - cooperative cancellation
//!
//! # Role in the workspace
//! Nothing here knows about scrolling. The widget crate registers its
//! scroll-sync hooks into the tracker and drives the tracker from the
//! scheduler's render pass.
//!
//! [`TimerHost`]: scrollable_core::TimerHost

pub mod cancellation;
pub mod deferred;
pub mod render_scheduler;
pub mod subscription;

pub use cancellation::{CancellationSource, CancellationToken};
pub use deferred::DeferredTask;
pub use render_scheduler::{DEFAULT_COALESCING_WINDOW, RenderScheduler, SchedulerStats};
pub use subscription::{
    Dispose, HookError, RefreshError, RefreshSummary, SubscriptionTracker,
};
