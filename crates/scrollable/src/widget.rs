#![forbid(unsafe_code)]

//! The scrollable widget: lifecycle, public surface, and the render pass.
//!
//! # Render pass
//!
//! Every pass runs the same three steps in order:
//!
//! 1. render the template into the shadow root
//! 2. refresh scroll-sync subscriptions against the fresh nodes
//! 3. re-arm the content size observation
//!
//! Passes are requested through a [`RenderScheduler`], so a burst of
//! attribute changes becomes a single pass one coalescing window after the
//! last change. Attaching runs the first pass immediately.
//!
//! # Lifecycle
//!
//! ```text
//!  new ──► detached ──on_attach──► attached ──on_detach──► detached
//!              ▲                                              │
//!              └──────────────────────────────────────────────┘
//! ```
//!
//! While detached, mutations only update [`WidgetState`]; nothing is
//! scheduled and no listeners or observers are live.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use scrollable_core::{
    Axis, Host, HostDocument, HostError, NodeRef, RenderingEngine, StylesheetRepository,
};
use scrollable_runtime::{RenderScheduler, SchedulerStats};

use crate::config::WidgetConfig;
use crate::error::{AttributeError, WidgetError};
use crate::size_monitor::ContentSizeMonitor;
use crate::state::{ScrollbarPosition, WidgetState, encode_scrollbars, parse_offset, parse_scrollbars};
use crate::sync::{Role, ScrollSyncEngine};
use crate::template::render_tree;

const SCROLLBARS: &str = "scrollbars";

struct WidgetInner<H: Host + 'static> {
    host: Rc<H>,
    config: WidgetConfig,
    element: NodeRef,
    shadow: NodeRef,
    state: RefCell<WidgetState>,
    sync: RefCell<ScrollSyncEngine<H>>,
    monitor: RefCell<ContentSizeMonitor<H>>,
    scheduler: RenderScheduler<H, Result<(), WidgetError>>,
    attached: Cell<bool>,
    last_error: RefCell<Option<WidgetError>>,
}

impl<H: Host + 'static> WidgetInner<H> {
    /// Render, refresh, re-arm. Every step runs even if an earlier
    /// subscription step failed; the first failure is returned.
    fn pass(&self) -> Result<(), WidgetError> {
        if !self.attached.get() {
            tracing::trace!(target: "scrollable.widget", element = %self.element, "Skipping pass while detached");
            return Ok(());
        }

        let tree = render_tree(&self.config, &self.state.borrow());
        self.host.render(self.shadow, &tree)?;

        let synced = self.sync.borrow_mut().refresh();
        let armed = self.monitor.borrow_mut().rearm();
        tracing::debug!(
            target: "scrollable.widget",
            element = %self.element,
            sync_ok = synced.is_ok(),
            size_ok = armed.is_ok(),
            "Render pass complete"
        );
        synced?;
        armed?;
        Ok(())
    }

    fn request_render(&self) {
        if self.attached.get() {
            self.scheduler.request();
        } else {
            tracing::trace!(target: "scrollable.widget", element = %self.element, "Detached; render deferred to attach");
        }
    }
}

/// A viewport with proxy scrollbars, bound to one host element.
///
/// Cloning yields another handle to the same widget.
pub struct ScrollableWidget<H: Host + 'static> {
    inner: Rc<WidgetInner<H>>,
}

impl<H: Host + 'static> Clone for ScrollableWidget<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: Host + 'static> ScrollableWidget<H> {
    /// Build a widget on `element`: validates `config`, attaches the shadow
    /// root, and registers the stylesheet. The widget starts detached.
    pub fn new(host: Rc<H>, element: NodeRef, config: WidgetConfig) -> Result<Self, WidgetError> {
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(WidgetError::Config(problems));
        }
        let state = WidgetState::with_generated_id(config.default_scrollbars.clone())?;
        let shadow = host.attach_shadow(element)?;
        host.add_style(&config.stylesheet);

        let sync = ScrollSyncEngine::new(&host, element, shadow, &config);
        let monitor = ContentSizeMonitor::new(&host, shadow, &config);
        let window = config.coalescing_window();

        let inner = Rc::new_cyclic(|weak: &Weak<WidgetInner<H>>| {
            let weak = Weak::clone(weak);
            let pass = Weak::clone(&weak);
            let scheduler = RenderScheduler::new(Rc::clone(&host), window, move || {
                pass.upgrade().map_or(Ok(()), |inner| inner.pass())
            })
            .on_deferred(move |result: Result<(), WidgetError>| {
                let (Err(err), Some(inner)) = (result, weak.upgrade()) else {
                    return;
                };
                tracing::error!(
                    target: "scrollable.widget",
                    element = %inner.element,
                    error = %err,
                    "Render pass failed"
                );
                *inner.last_error.borrow_mut() = Some(err);
            });
            WidgetInner {
                host,
                config,
                element,
                shadow,
                state: RefCell::new(state),
                sync: RefCell::new(sync),
                monitor: RefCell::new(monitor),
                scheduler,
                attached: Cell::new(false),
                last_error: RefCell::new(None),
            }
        });

        tracing::debug!(
            target: "scrollable.widget",
            element = %element,
            shadow = %shadow,
            container_id = inner.state.borrow().container_id(),
            "Widget created"
        );
        Ok(Self { inner })
    }

    // --- lifecycle ---

    /// The element was connected to the document: wire subscriptions and
    /// render synchronously.
    pub fn on_attach(&self) -> Result<(), WidgetError> {
        let inner = &self.inner;
        inner.attached.set(true);
        inner
            .sync
            .borrow_mut()
            .set_active(inner.state.borrow().scrollbars());
        tracing::debug!(target: "scrollable.widget", element = %inner.element, "Attached");
        inner.scheduler.run_now()
    }

    /// The element was disconnected: cancel the pending pass and dispose
    /// every subscription and observation. Idempotent.
    pub fn on_detach(&self) {
        let inner = &self.inner;
        let was_attached = inner.attached.replace(false);
        let cancelled = inner.scheduler.cancel();
        let disposed = inner.sync.borrow_mut().dispose_all();
        let stopped = inner.monitor.borrow_mut().stop();
        if was_attached {
            tracing::debug!(
                target: "scrollable.widget",
                element = %inner.element,
                cancelled,
                disposed,
                stopped,
                "Detached"
            );
        }
    }

    /// An observed attribute changed on the host element.
    ///
    /// Equal old and new values are ignored. A malformed `scrollbars` value
    /// is rejected without touching state.
    pub fn attribute_changed(
        &self,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<(), WidgetError> {
        if old == new {
            return Ok(());
        }
        if !self.inner.config.observes(name) {
            tracing::trace!(target: "scrollable.widget", attribute = name, "Ignoring unobserved attribute");
            return Ok(());
        }
        if name == SCROLLBARS {
            return match new {
                Some(value) => self.set_scrollbars_str(value),
                None => self.set_scrollbars(self.inner.config.default_scrollbars.clone()),
            };
        }

        let changed = self.inner.state.borrow_mut().set_delegated(name, new);
        if changed {
            tracing::debug!(target: "scrollable.widget", attribute = name, value = ?new, "Delegated attribute changed");
            self.inner.request_render();
        }
        Ok(())
    }

    // --- scrollbars ---

    /// Active scrollbars, in order.
    #[must_use]
    pub fn scrollbars(&self) -> Vec<ScrollbarPosition> {
        self.inner.state.borrow().scrollbars().to_vec()
    }

    /// Replace the active scrollbars and reflect them onto the element's
    /// `scrollbars` attribute.
    pub fn set_scrollbars(&self, positions: Vec<ScrollbarPosition>) -> Result<(), WidgetError> {
        let inner = &self.inner;
        let encoded = encode_scrollbars(&positions);
        let delta = inner
            .state
            .borrow_mut()
            .set_scrollbars(positions)
            .inspect_err(|err| {
                tracing::warn!(target: "scrollable.widget", error = %err, "Rejected scrollbars");
            })?;
        inner
            .host
            .set_attribute(inner.element, SCROLLBARS, Some(&encoded));

        if inner.attached.get() {
            inner
                .sync
                .borrow_mut()
                .set_active(inner.state.borrow().scrollbars());
        }
        tracing::debug!(
            target: "scrollable.widget",
            scrollbars = %encoded,
            added = ?delta.added,
            removed = ?delta.removed,
            "Scrollbars updated"
        );
        inner.request_render();
        Ok(())
    }

    /// [`Self::set_scrollbars`] from the serialized attribute form.
    pub fn set_scrollbars_str(&self, value: &str) -> Result<(), WidgetError> {
        let positions = parse_scrollbars(value).inspect_err(|err| {
            tracing::warn!(target: "scrollable.widget", value, error = %err, "Malformed scrollbars attribute");
        })?;
        self.set_scrollbars(positions)
    }

    // --- scroll position ---

    /// Container's vertical offset; `0.0` before the first render.
    #[must_use]
    pub fn scroll_top(&self) -> f64 {
        self.inner.sync.borrow().scroll_offset().top
    }

    /// Container's horizontal offset; `0.0` before the first render.
    #[must_use]
    pub fn scroll_left(&self) -> f64 {
        self.inner.sync.borrow().scroll_offset().left
    }

    /// Scroll the container vertically. No-op before the first render.
    pub fn set_scroll_top(&self, value: f64) {
        self.inner.sync.borrow().scroll_to(Axis::Vertical, value);
    }

    /// Scroll the container horizontally. No-op before the first render.
    pub fn set_scroll_left(&self, value: f64) {
        self.inner.sync.borrow().scroll_to(Axis::Horizontal, value);
    }

    pub fn set_scroll_top_str(&self, value: &str) -> Result<(), AttributeError> {
        self.set_scroll_top(parse_offset(value)?);
        Ok(())
    }

    pub fn set_scroll_left_str(&self, value: &str) -> Result<(), AttributeError> {
        self.set_scroll_left(parse_offset(value)?);
        Ok(())
    }

    /// Set the gap between the viewport and its scrollbars, as a CSS length.
    pub fn set_scrollable_gap(&self, value: &str) {
        let config = &self.inner.config;
        self.inner.host.set_property(
            &config.stylesheet,
            &config.wrapper_selector(),
            &config.variables.scrollable_gap,
            value,
        );
        tracing::debug!(target: "scrollable.widget", value, "Scrollable gap set");
    }

    // --- rendering ---

    /// Run a render pass now, superseding any pending one.
    pub fn render_now(&self) -> Result<(), WidgetError> {
        let inner = &self.inner;
        if !inner.attached.get() {
            return Err(WidgetError::Render(HostError::Detached(inner.element)));
        }
        inner.scheduler.run_now()
    }

    /// Run the pending pass now, if there is one. Returns whether one ran.
    pub fn flush_render(&self) -> Result<bool, WidgetError> {
        match self.inner.scheduler.flush() {
            Some(result) => result.map(|()| true),
            None => Ok(false),
        }
    }

    // --- inspection ---

    #[must_use]
    pub fn element(&self) -> NodeRef {
        self.inner.element
    }

    #[must_use]
    pub fn shadow_root(&self) -> NodeRef {
        self.inner.shadow
    }

    #[must_use]
    pub fn container_id(&self) -> String {
        self.inner.state.borrow().container_id().to_owned()
    }

    #[must_use]
    pub fn state(&self) -> WidgetState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn config(&self) -> &WidgetConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.attached.get()
    }

    #[must_use]
    pub fn is_render_pending(&self) -> bool {
        self.inner.scheduler.is_pending()
    }

    #[must_use]
    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.inner.scheduler.stats()
    }

    /// Node a role's subscription is currently bound to.
    #[must_use]
    pub fn bound_node(&self, role: Role) -> Option<NodeRef> {
        match role {
            Role::Content => self.inner.monitor.borrow().observed_node(),
            role => self.inner.sync.borrow().bound_node(role),
        }
    }

    /// Whether a role has a registered subscription.
    #[must_use]
    pub fn is_registered(&self, role: Role) -> bool {
        match role {
            Role::Content => true,
            role => self.inner.sync.borrow().is_registered(role),
        }
    }

    /// Node currently rendered for a role, bound or not.
    #[must_use]
    pub fn locate(&self, role: Role) -> Option<NodeRef> {
        match role {
            Role::Container => self.inner.sync.borrow().container(),
            Role::Right => self.inner.sync.borrow().proxy(ScrollbarPosition::Right),
            Role::Bottom => self.inner.sync.borrow().proxy(ScrollbarPosition::Bottom),
            Role::Content => self.inner.monitor.borrow().content(),
        }
    }

    /// The failure of the last timer-driven pass, cleared on read.
    pub fn take_last_error(&self) -> Option<WidgetError> {
        self.inner.last_error.borrow_mut().take()
    }

    /// Whether the element is connected to the host document.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.host.is_connected(self.inner.element)
    }
}

impl<H: Host + 'static> fmt::Debug for ScrollableWidget<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollableWidget")
            .field("element", &self.inner.element)
            .field("attached", &self.inner.attached.get())
            .field("state", &self.inner.state.borrow())
            .field("scheduler", &self.inner.scheduler)
            .finish_non_exhaustive()
    }
}
