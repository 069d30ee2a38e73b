#![forbid(unsafe_code)]

//! In-memory document with browser-shaped event and timing semantics.
//!
//! # Structure
//!
//! Nodes live in an arena keyed by [`NodeRef`]. Handles are minted from a
//! monotonic counter and never reused, so a node recreated by the patcher is
//! distinguishable from the one it replaced. A shadow root has no parent; it
//! points at its host element instead.
//!
//! # Event delivery
//!
//! | Source                               | Delivery                           |
//! |--------------------------------------|------------------------------------|
//! | [`HostDocument::dispatch_event`]     | synchronous                        |
//! | scroll offset change                 | queued, one per node until flushed |
//! | [`HeadlessDocument::user_set_control_value`] | queued `Change`            |
//! | box-size change / new observation    | queued, one per observer           |
//!
//! Queued work is delivered by [`HeadlessDocument::flush_events`], which
//! [`HeadlessDocument::advance`] calls after every timer it runs.
//!
//! # Failure Modes
//!
//! - **Listener storms**: a listener that keeps queueing events would flush
//!   forever. Flushing stops after [`MAX_EVENTS_PER_FLUSH`] deliveries and
//!   leaves the rest queued.

use core::time::Duration;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};

use ahash::AHashMap;
use scrollable_core::{
    DomEvent, EventKind, EventPhase, HostDocument, HostError, Listener, ListenerId,
    ListenerOptions, NodeRef, ObserverId, ScrollOffset, Size, SizeCallback, TimerHost, TimerId,
};

use crate::DeterministicClock;
use crate::patch::DEFAULT_KEY_ATTRIBUTE;
use crate::stylesheets::StylesheetStore;

/// Upper bound on deliveries per [`HeadlessDocument::flush_events`] call.
pub const MAX_EVENTS_PER_FLUSH: usize = 10_000;

type Task = Box<dyn FnOnce()>;

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) tag: String,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) parent: Option<NodeRef>,
    pub(crate) children: Vec<NodeRef>,
    /// For shadow roots: the element they are attached to.
    pub(crate) host: Option<NodeRef>,
    pub(crate) shadow_root: Option<NodeRef>,
    scroll: ScrollOffset,
    value: f64,
    value_writes: u64,
    box_size: Size,
}

impl NodeData {
    pub(crate) fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            attributes: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
            host: None,
            shadow_root: None,
            scroll: ScrollOffset::ORIGIN,
            value: 0.0,
            value_writes: 0,
            box_size: Size::ZERO,
        }
    }
}

struct ListenerEntry {
    node: NodeRef,
    kind: EventKind,
    capture: bool,
    listener: Listener,
}

struct ObserverEntry {
    node: NodeRef,
    callback: SizeCallback,
}

enum Queued {
    Event(DomEvent),
    Size(ObserverId),
}

#[derive(Default)]
pub(crate) struct DocState {
    pub(crate) nodes: AHashMap<NodeRef, NodeData>,
    listeners: AHashMap<ListenerId, ListenerEntry>,
    observers: AHashMap<ObserverId, ObserverEntry>,
}

/// A headless document, timer queue, rendering engine, and stylesheet
/// repository in one host object.
pub struct HeadlessDocument {
    pub(crate) state: RefCell<DocState>,
    queue: RefCell<VecDeque<Queued>>,
    timers: RefCell<Vec<(Duration, TimerId, Task)>>,
    clock: RefCell<DeterministicClock>,
    pub(crate) stylesheets: RefCell<StylesheetStore>,
    pub(crate) key_attribute: String,
    pub(crate) renders: Cell<u64>,
    next_id: Cell<u64>,
    root: NodeRef,
}

impl HeadlessDocument {
    /// An empty document keyed on [`DEFAULT_KEY_ATTRIBUTE`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_key_attribute(DEFAULT_KEY_ATTRIBUTE)
    }

    /// An empty document whose patcher matches nodes on `key_attribute`.
    #[must_use]
    pub fn with_key_attribute(key_attribute: impl Into<String>) -> Self {
        let root = NodeRef::from_raw(0);
        let mut state = DocState::default();
        state.nodes.insert(root, NodeData::element("#document"));
        Self {
            state: RefCell::new(state),
            queue: RefCell::new(VecDeque::new()),
            timers: RefCell::new(Vec::new()),
            clock: RefCell::new(DeterministicClock::new()),
            stylesheets: RefCell::new(StylesheetStore::default()),
            key_attribute: key_attribute.into(),
            renders: Cell::new(0),
            next_id: Cell::new(1),
            root,
        }
    }

    /// The document node.
    #[must_use]
    pub const fn root(&self) -> NodeRef {
        self.root
    }

    pub(crate) fn mint(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeRef {
        let node = NodeRef::from_raw(self.mint());
        self.state
            .borrow_mut()
            .nodes
            .insert(node, NodeData::element(tag));
        node
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&self, parent: NodeRef, child: NodeRef) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.nodes.contains_key(&parent) {
            return Err(HostError::NodeNotFound(parent));
        }
        let previous = match state.nodes.get(&child) {
            Some(data) => data.parent,
            None => return Err(HostError::NodeNotFound(child)),
        };
        if let Some(previous) = previous
            && let Some(data) = state.nodes.get_mut(&previous)
        {
            data.children.retain(|c| *c != child);
        }
        if let Some(data) = state.nodes.get_mut(&child) {
            data.parent = Some(parent);
        }
        if let Some(data) = state.nodes.get_mut(&parent) {
            data.children.push(child);
        }
        Ok(())
    }

    /// Remove `node` and its subtree (including attached shadow trees).
    ///
    /// Removed handles become invalid; their listeners and observers are
    /// dropped.
    pub fn remove_node(&self, node: NodeRef) {
        let mut state = self.state.borrow_mut();
        let parent = state.nodes.get(&node).and_then(|d| d.parent);
        if let Some(parent) = parent
            && let Some(data) = state.nodes.get_mut(&parent)
        {
            data.children.retain(|c| *c != node);
        }

        let mut doomed = vec![node];
        let mut index = 0;
        while index < doomed.len() {
            if let Some(data) = state.nodes.get(&doomed[index]) {
                doomed.extend(data.children.iter().copied());
                doomed.extend(data.shadow_root);
            }
            index += 1;
        }
        for gone in &doomed {
            state.nodes.remove(gone);
        }
        state.listeners.retain(|_, entry| !doomed.contains(&entry.node));
        state.observers.retain(|_, entry| !doomed.contains(&entry.node));
        tracing::trace!(target: "scrollable.host", root = %node, removed = doomed.len(), "Removed subtree");
    }

    /// Detach `node` from its parent without destroying it.
    pub fn detach(&self, node: NodeRef) {
        let mut state = self.state.borrow_mut();
        let parent = state.nodes.get_mut(&node).and_then(|d| d.parent.take());
        if let Some(parent) = parent
            && let Some(data) = state.nodes.get_mut(&parent)
        {
            data.children.retain(|c| *c != node);
        }
    }

    #[must_use]
    pub fn exists(&self, node: NodeRef) -> bool {
        self.state.borrow().nodes.contains_key(&node)
    }

    #[must_use]
    pub fn tag(&self, node: NodeRef) -> Option<String> {
        self.state.borrow().nodes.get(&node).map(|d| d.tag.clone())
    }

    #[must_use]
    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|d| d.children.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn shadow_root(&self, host: NodeRef) -> Option<NodeRef> {
        self.state
            .borrow()
            .nodes
            .get(&host)
            .and_then(|d| d.shadow_root)
    }

    // --- simulated layout and input ---

    /// Set a node's border-box size, notifying size observers on change.
    pub fn set_box_size(&self, node: NodeRef, size: Size) {
        let changed = {
            let mut state = self.state.borrow_mut();
            match state.nodes.get_mut(&node) {
                Some(data) if data.box_size != size => {
                    data.box_size = size;
                    true
                }
                _ => false,
            }
        };
        if changed {
            let observers: Vec<ObserverId> = self
                .state
                .borrow()
                .observers
                .iter()
                .filter(|(_, entry)| entry.node == node)
                .map(|(id, _)| *id)
                .collect();
            for id in observers {
                self.queue_size(id);
            }
        }
    }

    /// Simulate the user scrolling `node` (wheel, keyboard, touch).
    pub fn user_scroll(&self, node: NodeRef, offset: ScrollOffset) {
        self.write_scroll(node, |_| offset);
    }

    /// Simulate the user moving a proxy control to `value`. Queues a
    /// native `Change` event.
    pub fn user_set_control_value(&self, node: NodeRef, value: f64) {
        let changed = {
            let mut state = self.state.borrow_mut();
            match state.nodes.get_mut(&node) {
                Some(data) if data.value != value => {
                    data.value = value;
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.queue
                .borrow_mut()
                .push_back(Queued::Event(DomEvent::native(EventKind::Change, node)));
        }
    }

    /// Number of programmatic value assignments a control has received.
    #[must_use]
    pub fn control_value_writes(&self, node: NodeRef) -> u64 {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map_or(0, |d| d.value_writes)
    }

    fn write_scroll(&self, node: NodeRef, update: impl FnOnce(ScrollOffset) -> ScrollOffset) {
        let changed = {
            let mut state = self.state.borrow_mut();
            match state.nodes.get_mut(&node) {
                Some(data) => {
                    let next = update(data.scroll);
                    let next = ScrollOffset::new(clamp_offset(next.top), clamp_offset(next.left));
                    let changed = next != data.scroll;
                    data.scroll = next;
                    changed
                }
                None => false,
            }
        };
        if !changed {
            return;
        }
        let mut queue = self.queue.borrow_mut();
        let already_queued = queue.iter().any(|queued| {
            matches!(queued, Queued::Event(event)
                if event.kind() == EventKind::Scroll && event.target() == node && event.is_trusted())
        });
        if !already_queued {
            queue.push_back(Queued::Event(DomEvent::native(EventKind::Scroll, node)));
        }
    }

    fn queue_size(&self, observer: ObserverId) {
        let mut queue = self.queue.borrow_mut();
        let already_queued = queue
            .iter()
            .any(|queued| matches!(queued, Queued::Size(id) if *id == observer));
        if !already_queued {
            queue.push_back(Queued::Size(observer));
        }
    }

    // --- delivery ---

    /// Number of undelivered events and size notifications.
    #[must_use]
    pub fn queued_events(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Deliver queued events and size notifications, including any queued
    /// while delivering. Returns how many were delivered.
    pub fn flush_events(&self) -> usize {
        let mut delivered = 0;
        while delivered < MAX_EVENTS_PER_FLUSH {
            let Some(next) = self.queue.borrow_mut().pop_front() else {
                return delivered;
            };
            delivered += 1;
            match next {
                Queued::Event(event) => self.dispatch_now(event),
                Queued::Size(id) => self.deliver_size(id),
            }
        }
        tracing::warn!(
            target: "scrollable.host",
            remaining = self.queued_events(),
            "Event flush limit reached"
        );
        delivered
    }

    fn deliver_size(&self, id: ObserverId) {
        let entry = {
            let state = self.state.borrow();
            state
                .observers
                .get(&id)
                .map(|entry| (entry.node, SizeCallback::clone(&entry.callback)))
        };
        if let Some((node, callback)) = entry {
            let size = self.scroll_size(node).unwrap_or(Size::ZERO);
            callback(node, size);
        }
    }

    /// Propagation path from `target` outwards, respecting shadow boundaries.
    fn propagation_path(&self, target: NodeRef, composed: bool) -> Vec<NodeRef> {
        let state = self.state.borrow();
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            let Some(data) = state.nodes.get(&node) else {
                break;
            };
            path.push(node);
            cursor = match (data.parent, data.host) {
                (Some(parent), _) => Some(parent),
                (None, Some(host)) if composed => Some(host),
                _ => None,
            };
        }
        path
    }

    fn dispatch_now(&self, mut event: DomEvent) {
        let path = self.propagation_path(event.target(), event.composed());
        let Some((&target, ancestors)) = path.split_first() else {
            tracing::trace!(target: "scrollable.host", node = %event.target(), "Dropping event for missing node");
            return;
        };

        for &node in ancestors.iter().rev() {
            self.invoke(node, &mut event, EventPhase::Capturing);
            if event.is_propagation_stopped() {
                return;
            }
        }
        self.invoke(target, &mut event, EventPhase::AtTarget);
        if event.is_propagation_stopped() || !event.bubbles() {
            return;
        }
        for &node in ancestors {
            self.invoke(node, &mut event, EventPhase::Bubbling);
            if event.is_propagation_stopped() {
                return;
            }
        }
    }

    fn invoke(&self, node: NodeRef, event: &mut DomEvent, phase: EventPhase) {
        let mut listeners: Vec<(ListenerId, Listener)> = {
            let state = self.state.borrow();
            state
                .listeners
                .iter()
                .filter(|(_, entry)| {
                    entry.node == node
                        && entry.kind == event.kind()
                        && match phase {
                            EventPhase::Capturing => entry.capture,
                            EventPhase::AtTarget => true,
                            EventPhase::Bubbling => !entry.capture,
                        }
                })
                .map(|(id, entry)| (*id, Listener::clone(&entry.listener)))
                .collect()
        };
        if listeners.is_empty() {
            return;
        }
        listeners.sort_by_key(|(id, _)| *id);
        event.enter(node, phase);
        for (id, listener) in listeners {
            // Listeners removed by an earlier listener on this node do not run.
            if !self.state.borrow().listeners.contains_key(&id) {
                continue;
            }
            listener(event);
        }
    }

    // --- time ---

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.borrow().now()
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Advance the clock by `dt`, running due timers in deadline order and
    /// flushing events after each one.
    pub fn advance(&self, dt: Duration) {
        let target = self.now().saturating_add(dt);
        loop {
            let due = {
                let mut timers = self.timers.borrow_mut();
                let next = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, (deadline, _, _))| *deadline <= target)
                    .min_by_key(|(_, (deadline, id, _))| (*deadline, *id))
                    .map(|(index, _)| index);
                next.map(|index| timers.remove(index))
            };
            let Some((deadline, id, task)) = due else {
                break;
            };
            self.clock.borrow_mut().set(deadline);
            tracing::trace!(target: "scrollable.host", timer = %id, "Running timer");
            task();
            self.flush_events();
        }
        self.clock.borrow_mut().set(target);
        self.flush_events();
    }

    /// Read a stylesheet variable written through the repository.
    #[must_use]
    pub fn style_property(&self, sheet: &str, selector: &str, variable: &str) -> Option<String> {
        self.stylesheets
            .borrow()
            .property(sheet, selector, variable)
            .map(str::to_owned)
    }

    /// Direct access to the stylesheet store.
    #[must_use]
    pub fn stylesheets(&self) -> std::cell::Ref<'_, StylesheetStore> {
        self.stylesheets.borrow()
    }

    /// Number of render passes applied through the rendering engine.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.renders.get()
    }

    /// Number of live listeners registered on `node`.
    #[must_use]
    pub fn listener_count(&self, node: NodeRef) -> usize {
        self.state
            .borrow()
            .listeners
            .values()
            .filter(|entry| entry.node == node)
            .count()
    }

    /// Number of live size observations on `node`.
    #[must_use]
    pub fn observer_count(&self, node: NodeRef) -> usize {
        self.state
            .borrow()
            .observers
            .values()
            .filter(|entry| entry.node == node)
            .count()
    }
}

impl Default for HeadlessDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HeadlessDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("HeadlessDocument")
            .field("nodes", &state.nodes.len())
            .field("listeners", &state.listeners.len())
            .field("observers", &state.observers.len())
            .field("queued", &self.queue.borrow().len())
            .field("timers", &self.timers.borrow().len())
            .field("now", &self.now())
            .finish()
    }
}

fn clamp_offset(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

impl HostDocument for HeadlessDocument {
    fn attach_shadow(&self, host: NodeRef) -> Result<NodeRef, HostError> {
        let root = NodeRef::from_raw(self.mint());
        let mut state = self.state.borrow_mut();
        match state.nodes.get_mut(&host) {
            None => return Err(HostError::NodeNotFound(host)),
            Some(data) if data.shadow_root.is_some() => {
                return Err(HostError::ShadowRootExists(host));
            }
            Some(data) => data.shadow_root = Some(root),
        }
        let mut data = NodeData::element("#shadow-root");
        data.host = Some(host);
        state.nodes.insert(root, data);
        Ok(root)
    }

    fn is_connected(&self, node: NodeRef) -> bool {
        let state = self.state.borrow();
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = state
                .nodes
                .get(&current)
                .and_then(|data| data.parent.or(data.host));
        }
        false
    }

    fn query_section(&self, root: NodeRef, attribute: &str, value: &str) -> Option<NodeRef> {
        let state = self.state.borrow();
        let mut stack: Vec<NodeRef> = state
            .nodes
            .get(&root)?
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(node) = stack.pop() {
            let Some(data) = state.nodes.get(&node) else {
                continue;
            };
            if data.attributes.get(attribute).map(String::as_str) == Some(value) {
                return Some(node);
            }
            stack.extend(data.children.iter().rev().copied());
        }
        None
    }

    fn attribute(&self, node: NodeRef, name: &str) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .and_then(|d| d.attributes.get(name).cloned())
    }

    fn set_attribute(&self, node: NodeRef, name: &str, value: Option<&str>) {
        let mut state = self.state.borrow_mut();
        if let Some(data) = state.nodes.get_mut(&node) {
            match value {
                Some(value) => {
                    data.attributes.insert(name.to_owned(), value.to_owned());
                }
                None => {
                    data.attributes.remove(name);
                }
            }
        }
    }

    fn add_listener(
        &self,
        node: NodeRef,
        kind: EventKind,
        options: ListenerOptions,
        listener: Listener,
    ) -> Result<ListenerId, HostError> {
        if !self.exists(node) {
            return Err(HostError::NodeNotFound(node));
        }
        let id = ListenerId::from_raw(self.mint());
        self.state.borrow_mut().listeners.insert(
            id,
            ListenerEntry {
                node,
                kind,
                capture: options.capture,
                listener,
            },
        );
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.state.borrow_mut().listeners.remove(&id);
    }

    fn dispatch_event(&self, event: DomEvent) {
        self.dispatch_now(event);
    }

    fn scroll_offset(&self, node: NodeRef) -> Option<ScrollOffset> {
        self.state.borrow().nodes.get(&node).map(|d| d.scroll)
    }

    fn set_scroll_top(&self, node: NodeRef, value: f64) {
        self.write_scroll(node, |offset| ScrollOffset::new(value, offset.left));
    }

    fn set_scroll_left(&self, node: NodeRef, value: f64) {
        self.write_scroll(node, |offset| ScrollOffset::new(offset.top, value));
    }

    fn control_value(&self, node: NodeRef) -> Option<f64> {
        self.state.borrow().nodes.get(&node).map(|d| d.value)
    }

    fn set_control_value(&self, node: NodeRef, value: f64) {
        if let Some(data) = self.state.borrow_mut().nodes.get_mut(&node) {
            data.value = value;
            data.value_writes += 1;
        }
    }

    fn scroll_size(&self, node: NodeRef) -> Option<Size> {
        fn extent(state: &DocState, node: NodeRef) -> Size {
            let Some(data) = state.nodes.get(&node) else {
                return Size::ZERO;
            };
            data.children
                .iter()
                .map(|child| extent(state, *child))
                .fold(data.box_size, |acc, child| {
                    Size::new(acc.width.max(child.width), acc.height.max(child.height))
                })
        }
        let state = self.state.borrow();
        state.nodes.contains_key(&node).then(|| extent(&state, node))
    }

    fn observe_size(
        &self,
        node: NodeRef,
        callback: SizeCallback,
    ) -> Result<ObserverId, HostError> {
        if !self.exists(node) {
            return Err(HostError::NodeNotFound(node));
        }
        let id = ObserverId::from_raw(self.mint());
        self.state
            .borrow_mut()
            .observers
            .insert(id, ObserverEntry { node, callback });
        self.queue_size(id);
        Ok(id)
    }

    fn unobserve(&self, id: ObserverId) {
        self.state.borrow_mut().observers.remove(&id);
    }
}

impl TimerHost for HeadlessDocument {
    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId::from_raw(self.mint());
        let deadline = self.now().saturating_add(delay);
        self.timers.borrow_mut().push((deadline, id, task));
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.timers.borrow_mut().retain(|(_, queued, _)| *queued != id);
    }
}
