#![forbid(unsafe_code)]

//! Bidirectional scroll synchronization between the viewport and its proxy
//! scrollbars.
//!
//! # Event protocol
//!
//! ```text
//!  user scrolls container ──► native Scroll on container
//!                               │ origin == container?
//!                               ├─ stop propagation
//!                               ├─ proxy.value = offset   (silent write)
//!                               └─ Scroll on widget boundary (once)
//!
//!  user drags proxy ────────► Change on proxy
//!                               │ origin == proxy?
//!                               ├─ stop propagation
//!                               └─ container.scroll_{top,left} = value
//!                                    └─► native Scroll on container (above)
//! ```
//!
//! A proxy-driven update never notifies external listeners itself. The
//! container's resulting scroll event does, so every input produces exactly
//! one boundary notification.
//!
//! # Invariants
//!
//! 1. At most one container write per external input. Proxy values are
//!    assigned through [`HostDocument::set_control_value`], which never
//!    raises a `Change` event, so the proxy branch cannot re-enter.
//! 2. Listeners hold no node handles. Every event re-resolves the container
//!    and proxies through their locators.
//! 3. The container role is always registered. A proxy role is registered
//!    exactly while its scrollbar is active, and only active proxies receive
//!    the container's offset.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use scrollable_core::{
    Axis, DomEvent, EventKind, Host, HostDocument, ListenerOptions, NodeRef, ScrollOffset,
};
use scrollable_runtime::{Dispose, HookError, RefreshError, RefreshSummary, SubscriptionTracker};

use crate::config::{Section, WidgetConfig};
use crate::state::ScrollbarPosition;

/// Logical parts of the widget that subscriptions are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// The scrolled viewport.
    Container,
    /// Vertical proxy scrollbar.
    Right,
    /// Horizontal proxy scrollbar.
    Bottom,
    /// The sized content inside the viewport, watched for size changes.
    Content,
}

impl Role {
    #[must_use]
    pub const fn section(self) -> Section {
        match self {
            Self::Container => Section::ScrollContainer,
            Self::Right => Section::RightScrollbar,
            Self::Bottom => Section::BottomScrollbar,
            Self::Content => Section::ScrollSizer,
        }
    }

    /// The scrollbar position for proxy roles.
    #[must_use]
    pub const fn scrollbar(self) -> Option<ScrollbarPosition> {
        match self {
            Self::Right => Some(ScrollbarPosition::Right),
            Self::Bottom => Some(ScrollbarPosition::Bottom),
            Self::Container | Self::Content => None,
        }
    }
}

impl From<ScrollbarPosition> for Role {
    fn from(position: ScrollbarPosition) -> Self {
        match position {
            ScrollbarPosition::Right => Self::Right,
            ScrollbarPosition::Bottom => Self::Bottom,
        }
    }
}

/// Resolves a role to whichever node currently carries its section id.
///
/// Never caches: each call queries the shadow root again.
pub struct Locator<H: ?Sized> {
    host: Weak<H>,
    root: NodeRef,
    attribute: Rc<str>,
    value: Rc<str>,
}

impl<H: HostDocument + ?Sized> Locator<H> {
    #[must_use]
    pub fn new(host: &Rc<H>, root: NodeRef, config: &WidgetConfig, role: Role) -> Self {
        Self {
            host: Rc::downgrade(host),
            root,
            attribute: Rc::from(config.section_attribute.as_str()),
            value: Rc::from(config.section_id(role.section()).as_str()),
        }
    }

    #[must_use]
    pub fn resolve(&self) -> Option<NodeRef> {
        self.host
            .upgrade()?
            .query_section(self.root, &self.attribute, &self.value)
    }
}

impl<H: ?Sized> Clone for Locator<H> {
    fn clone(&self) -> Self {
        Self {
            host: Weak::clone(&self.host),
            root: self.root,
            attribute: Rc::clone(&self.attribute),
            value: Rc::clone(&self.value),
        }
    }
}

impl<H: ?Sized> fmt::Debug for Locator<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locator")
            .field("root", &self.root)
            .field("section", &self.value)
            .finish()
    }
}

/// Locators for every part the listeners need to reach, plus the active
/// scrollbars they may write to.
struct Parts<H: ?Sized> {
    container: Locator<H>,
    right: Locator<H>,
    bottom: Locator<H>,
    active: Rc<RefCell<Vec<ScrollbarPosition>>>,
}

impl<H: ?Sized> Clone for Parts<H> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            right: self.right.clone(),
            bottom: self.bottom.clone(),
            active: Rc::clone(&self.active),
        }
    }
}

impl<H: HostDocument + ?Sized> Parts<H> {
    fn proxy(&self, position: ScrollbarPosition) -> &Locator<H> {
        match position {
            ScrollbarPosition::Right => &self.right,
            ScrollbarPosition::Bottom => &self.bottom,
        }
    }
}

/// Registers the scroll-sync hooks into a [`SubscriptionTracker`] and keeps
/// the proxy roles in step with the active scrollbars.
pub struct ScrollSyncEngine<H: Host + 'static> {
    host: Rc<H>,
    boundary: NodeRef,
    parts: Parts<H>,
    tracker: SubscriptionTracker<Role, NodeRef>,
}

impl<H: Host + 'static> ScrollSyncEngine<H> {
    /// Create an engine for the widget whose element is `boundary` and
    /// whose parts render under `root`. Registers the container role.
    pub fn new(host: &Rc<H>, boundary: NodeRef, root: NodeRef, config: &WidgetConfig) -> Self {
        let parts = Parts {
            container: Locator::new(host, root, config, Role::Container),
            right: Locator::new(host, root, config, Role::Right),
            bottom: Locator::new(host, root, config, Role::Bottom),
            active: Rc::new(RefCell::new(Vec::new())),
        };
        let mut engine = Self {
            host: Rc::clone(host),
            boundary,
            parts,
            tracker: SubscriptionTracker::new(),
        };
        engine.register_container();
        engine
    }

    fn register_container(&mut self) {
        let locator = self.parts.container.clone();
        let host = Rc::downgrade(&self.host);
        let parts = self.parts.clone();
        let boundary = self.boundary;
        self.tracker.register(
            Role::Container,
            move || locator.resolve(),
            move |node: &NodeRef| {
                let live = host_of(&host)?;
                let host = Weak::clone(&host);
                let parts = parts.clone();
                let listener = Rc::new(move |event: &mut DomEvent| {
                    on_container_scroll(&host, &parts, boundary, event);
                });
                attach(&live, *node, EventKind::Scroll, listener)
            },
        );
    }

    fn register_proxy(&mut self, position: ScrollbarPosition) {
        let locator = self.parts.proxy(position).clone();
        let host = Rc::downgrade(&self.host);
        let parts = self.parts.clone();
        self.tracker.register(
            Role::from(position),
            move || locator.resolve(),
            move |node: &NodeRef| {
                let live = host_of(&host)?;
                let host = Weak::clone(&host);
                let parts = parts.clone();
                seed_proxy(&*live, &parts, *node, position);
                let listener = Rc::new(move |event: &mut DomEvent| {
                    on_proxy_change(&host, &parts, position, event);
                });
                attach(&live, *node, EventKind::Change, listener)
            },
        );
    }

    /// Register hooks for newly active scrollbars and unregister (disposing)
    /// hooks for removed ones. Takes effect on the next [`Self::refresh`].
    pub fn set_active(&mut self, active: &[ScrollbarPosition]) {
        self.parts.active.replace(active.to_vec());
        for position in ScrollbarPosition::ALL {
            let role = Role::from(position);
            let wanted = active.contains(&position);
            let registered = self.tracker.is_registered(&role);
            if wanted && !registered {
                self.register_proxy(position);
            } else if !wanted && registered {
                self.tracker.unregister(&role);
            }
        }
    }

    /// Re-resolve every role and rewire listeners whose node changed.
    pub fn refresh(&mut self) -> Result<RefreshSummary, RefreshError<Role>> {
        self.tracker.refresh()
    }

    /// Detach every listener. Registrations survive for a later refresh.
    pub fn dispose_all(&mut self) -> usize {
        self.tracker.dispose_all()
    }

    #[must_use]
    pub fn is_registered(&self, role: Role) -> bool {
        self.tracker.is_registered(&role)
    }

    #[must_use]
    pub fn bound_node(&self, role: Role) -> Option<NodeRef> {
        self.tracker.bound_node(&role).copied()
    }

    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.tracker.bound_count()
    }

    /// The node currently playing the container role.
    #[must_use]
    pub fn container(&self) -> Option<NodeRef> {
        self.parts.container.resolve()
    }

    /// The node currently playing a proxy role.
    #[must_use]
    pub fn proxy(&self, position: ScrollbarPosition) -> Option<NodeRef> {
        self.parts.proxy(position).resolve()
    }

    /// The container's offset, or the origin before the first render.
    #[must_use]
    pub fn scroll_offset(&self) -> ScrollOffset {
        self.container()
            .and_then(|node| self.host.scroll_offset(node))
            .unwrap_or(ScrollOffset::ORIGIN)
    }

    /// Write the container's offset along `axis`. No-op before the first
    /// render.
    pub fn scroll_to(&self, axis: Axis, value: f64) {
        let Some(container) = self.container() else {
            tracing::trace!(target: "scrollable.sync", axis = axis.name(), "No container; scroll ignored");
            return;
        };
        write_axis(&*self.host, container, axis, value);
    }
}

impl<H: Host + 'static> fmt::Debug for ScrollSyncEngine<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollSyncEngine")
            .field("boundary", &self.boundary)
            .field("tracker", &self.tracker)
            .finish()
    }
}

fn host_of<H: ?Sized>(host: &Weak<H>) -> Result<Rc<H>, HookError> {
    host.upgrade()
        .ok_or_else(|| HookError::Failed("host document dropped".into()))
}

/// Add a capture listener and return its detach.
fn attach<H: HostDocument + ?Sized + 'static>(
    host: &Rc<H>,
    node: NodeRef,
    kind: EventKind,
    listener: Rc<dyn Fn(&mut DomEvent)>,
) -> Result<Dispose, HookError> {
    let id = host.add_listener(node, kind, ListenerOptions::capture(), listener)?;
    let host = Rc::downgrade(host);
    Ok(Box::new(move || {
        if let Some(host) = host.upgrade() {
            host.remove_listener(id);
        }
    }))
}

fn write_axis<H: HostDocument + ?Sized>(host: &H, container: NodeRef, axis: Axis, value: f64) {
    match axis {
        Axis::Vertical => host.set_scroll_top(container, value),
        Axis::Horizontal => host.set_scroll_left(container, value),
    }
}

fn on_container_scroll<H: HostDocument + ?Sized>(
    host: &Weak<H>,
    parts: &Parts<H>,
    boundary: NodeRef,
    event: &mut DomEvent,
) {
    let Some(host) = host.upgrade() else {
        return;
    };
    let Some(container) = parts.container.resolve() else {
        return;
    };
    if event.target() != container {
        return;
    }
    event.stop_propagation();

    let offset = host.scroll_offset(container).unwrap_or(ScrollOffset::ORIGIN);
    let active = parts.active.borrow().clone();
    for position in active {
        if let Some(proxy) = parts.proxy(position).resolve() {
            let value = offset.along(position.axis());
            host.set_control_value(proxy, value);
            tracing::trace!(target: "scrollable.sync", proxy = %proxy, scrollbar = %position, value, "Proxy updated");
        }
    }
    tracing::debug!(
        target: "scrollable.sync",
        top = offset.top,
        left = offset.left,
        "Container scrolled"
    );
    host.dispatch_event(DomEvent::new(EventKind::Scroll, boundary));
}

/// Bring a freshly bound proxy up to the container's current offset.
fn seed_proxy<H: HostDocument + ?Sized>(
    host: &H,
    parts: &Parts<H>,
    proxy: NodeRef,
    position: ScrollbarPosition,
) {
    let Some(offset) = parts
        .container
        .resolve()
        .and_then(|container| host.scroll_offset(container))
    else {
        return;
    };
    let value = offset.along(position.axis());
    if host.control_value(proxy) != Some(value) {
        host.set_control_value(proxy, value);
        tracing::trace!(target: "scrollable.sync", proxy = %proxy, scrollbar = %position, value, "Proxy seeded");
    }
}

fn on_proxy_change<H: HostDocument + ?Sized>(
    host: &Weak<H>,
    parts: &Parts<H>,
    position: ScrollbarPosition,
    event: &mut DomEvent,
) {
    let Some(host) = host.upgrade() else {
        return;
    };
    let Some(proxy) = parts.proxy(position).resolve() else {
        return;
    };
    if event.target() != proxy {
        return;
    }
    event.stop_propagation();

    let Some(container) = parts.container.resolve() else {
        return;
    };
    let value = host.control_value(proxy).unwrap_or(0.0);
    tracing::debug!(target: "scrollable.sync", scrollbar = %position, value, "Proxy moved");
    write_axis(&*host, container, position.axis(), value);
}
