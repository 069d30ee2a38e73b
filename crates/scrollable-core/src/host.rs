#![forbid(unsafe_code)]

//! Host traits: the narrow interfaces the widget consumes.
//!
//! The widget never touches a concrete document. Everything it needs from
//! its environment flows through these traits, so the same widget code runs
//! against a browser binding or the deterministic headless host in
//! `scrollable-web`.
//!
//! All methods take `&self`. Hosts are single-threaded and re-entrant:
//! a listener invoked from [`HostDocument::dispatch_event`] may call back
//! into the host, so implementations must not hold internal borrows while
//! running callbacks.

use core::time::Duration;
use std::rc::Rc;

use crate::event::{DomEvent, EventKind, Listener, ListenerOptions};
use crate::geometry::{ScrollOffset, Size};
use crate::node::{ListenerId, NodeRef, ObserverId, TimerId};
use crate::vnode::VNode;

/// Host-side failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("{0} does not exist")]
    NodeNotFound(NodeRef),
    #[error("{0} is not connected to the document")]
    Detached(NodeRef),
    #[error("{0} already has a shadow root")]
    ShadowRootExists(NodeRef),
}

/// Box-size observation callback: the observed node and its scroll size.
pub type SizeCallback = Rc<dyn Fn(NodeRef, Size)>;

/// Document access: structure queries, attributes, events, scroll state.
pub trait HostDocument {
    /// Attach an isolation boundary to `host` and return its root.
    fn attach_shadow(&self, host: NodeRef) -> Result<NodeRef, HostError>;

    /// Whether `node` exists and is reachable from the document root.
    fn is_connected(&self, node: NodeRef) -> bool;

    /// First descendant of `root` whose `attribute` equals `value`.
    fn query_section(&self, root: NodeRef, attribute: &str, value: &str) -> Option<NodeRef>;

    fn attribute(&self, node: NodeRef, name: &str) -> Option<String>;

    /// Set (`Some`) or remove (`None`) an attribute. Missing nodes are ignored.
    fn set_attribute(&self, node: NodeRef, name: &str, value: Option<&str>);

    fn add_listener(
        &self,
        node: NodeRef,
        kind: EventKind,
        options: ListenerOptions,
        listener: Listener,
    ) -> Result<ListenerId, HostError>;

    /// Remove a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);

    /// Dispatch a script-originated event synchronously.
    fn dispatch_event(&self, event: DomEvent);

    /// Current scroll offset, or `None` when the node does not exist.
    fn scroll_offset(&self, node: NodeRef) -> Option<ScrollOffset>;

    /// Write the vertical scroll offset. The host fires a native `Scroll`
    /// event on `node` when the effective offset changes.
    fn set_scroll_top(&self, node: NodeRef, value: f64);

    /// Horizontal counterpart of [`Self::set_scroll_top`].
    fn set_scroll_left(&self, node: NodeRef, value: f64);

    /// Current value of a proxy control.
    fn control_value(&self, node: NodeRef) -> Option<f64>;

    /// Assign a proxy control's value. Programmatic assignment never fires
    /// a `Change` event.
    fn set_control_value(&self, node: NodeRef, value: f64);

    /// Total scrollable size of `node`'s content.
    fn scroll_size(&self, node: NodeRef) -> Option<Size>;

    /// Observe box-size changes of `node`.
    fn observe_size(
        &self,
        node: NodeRef,
        callback: SizeCallback,
    ) -> Result<ObserverId, HostError>;

    /// Stop an observation. Unknown ids are ignored.
    fn unobserve(&self, id: ObserverId);
}

/// Single-shot timers on the host event loop.
pub trait TimerHost {
    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId;

    /// Cancel a pending timer. Fired or unknown ids are ignored.
    fn clear_timeout(&self, id: TimerId);
}

/// Declarative template-to-node rendering.
pub trait RenderingEngine {
    /// Register a stylesheet to be materialized once.
    fn add_style(&self, sheet: &str);

    /// Patch `root`'s children to match `tree`. Idempotent for equal trees.
    fn render(&self, root: NodeRef, tree: &VNode) -> Result<(), HostError>;
}

/// Scoped CSS-variable storage.
pub trait StylesheetRepository {
    fn set_property(&self, sheet: &str, selector: &str, variable: &str, value: &str);
}

/// Everything a widget instance needs from its environment.
pub trait Host: HostDocument + TimerHost + RenderingEngine + StylesheetRepository {}

impl<T> Host for T where T: HostDocument + TimerHost + RenderingEngine + StylesheetRepository {}
