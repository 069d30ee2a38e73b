#![forbid(unsafe_code)]

//! DOM-style events observed and emitted by the widget.
//!
//! The model is the standard three-phase dispatch: capture listeners on
//! ancestors run outermost first, then every listener on the target, then
//! (for bubbling events) non-capture listeners on ancestors innermost first.
//! [`DomEvent::stop_propagation`] ends dispatch after the current node.
//!
//! # Event kinds
//!
//! | Kind     | Bubbles | Fired by                                              |
//! |----------|---------|-------------------------------------------------------|
//! | `Scroll` | no      | a node whose scroll offset changed, or the widget boundary |
//! | `Change` | yes     | a proxy control whose value changed through user input |

use std::rc::Rc;

use crate::node::NodeRef;

/// The event types the widget cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A scroll offset changed.
    Scroll,
    /// A proxy control's value changed due to user interaction.
    Change,
}

impl EventKind {
    /// DOM event type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Change => "change",
        }
    }

    /// Whether events of this kind bubble by default.
    #[must_use]
    pub const fn bubbles(self) -> bool {
        matches!(self, Self::Change)
    }
}

/// Dispatch phase the event is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Capturing,
    AtTarget,
    Bubbling,
}

/// Options for listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerOptions {
    /// Run during the capture phase when registered on an ancestor.
    pub capture: bool,
}

impl ListenerOptions {
    /// Capture-phase listener.
    #[must_use]
    pub const fn capture() -> Self {
        Self { capture: true }
    }

    /// Bubble-phase listener.
    #[must_use]
    pub const fn bubble() -> Self {
        Self { capture: false }
    }
}

/// One event travelling through the document.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    kind: EventKind,
    target: NodeRef,
    current_target: NodeRef,
    phase: EventPhase,
    bubbles: bool,
    composed: bool,
    trusted: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    /// A synthetic event, as dispatched by script.
    #[must_use]
    pub fn new(kind: EventKind, target: NodeRef) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            phase: EventPhase::AtTarget,
            bubbles: kind.bubbles(),
            composed: false,
            trusted: false,
            propagation_stopped: false,
        }
    }

    /// A native event, as fired by the host itself in response to a state
    /// change (user input, layout, scroll position updates).
    #[must_use]
    pub fn native(kind: EventKind, target: NodeRef) -> Self {
        Self {
            trusted: true,
            ..Self::new(kind, target)
        }
    }

    /// Override the bubbling flag.
    #[must_use]
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Allow the event to cross shadow-root boundaries.
    #[must_use]
    pub fn with_composed(mut self, composed: bool) -> Self {
        self.composed = composed;
        self
    }

    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// The node the event was dispatched to.
    #[must_use]
    pub const fn target(&self) -> NodeRef {
        self.target
    }

    /// The node whose listeners are currently running.
    #[must_use]
    pub const fn current_target(&self) -> NodeRef {
        self.current_target
    }

    #[must_use]
    pub const fn phase(&self) -> EventPhase {
        self.phase
    }

    #[must_use]
    pub const fn bubbles(&self) -> bool {
        self.bubbles
    }

    #[must_use]
    pub const fn composed(&self) -> bool {
        self.composed
    }

    /// True for host-originated events, false for script-dispatched ones.
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Stop dispatch once the listeners of the current node have run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    #[must_use]
    pub const fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Move the event to `node` in `phase`. Called by hosts while dispatching.
    pub fn enter(&mut self, node: NodeRef, phase: EventPhase) {
        self.current_target = node;
        self.phase = phase;
    }
}

/// An event listener. Listeners are shared so hosts can release their
/// registry borrow before invoking them.
pub type Listener = Rc<dyn Fn(&mut DomEvent)>;
