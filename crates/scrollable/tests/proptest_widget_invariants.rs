//! Property-based invariant tests for `ScrollableWidget` on the headless host.
//!
//! 1. No rendered part ever carries more than one sync listener
//! 2. Once renders settle, each active role is bound to its rendered node
//!    and each inactive proxy role is unbound
//! 3. A detached widget holds no bindings
//! 4. One user scroll produces at most one boundary notification

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use proptest::prelude::*;
use scrollable::{Role, ScrollableWidget, ScrollbarPosition, WidgetConfig};
use scrollable_core::{DomEvent, EventKind, HostDocument, ListenerOptions, ScrollOffset};
use scrollable_web::HeadlessDocument;

use ScrollbarPosition::{Bottom, Right};

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    SetScrollbars(Vec<ScrollbarPosition>),
    Class(u8),
    Advance(u64),
    UserScroll(u16, u16),
    Detach,
    Attach,
}

fn scrollbars_strategy() -> impl Strategy<Value = Vec<ScrollbarPosition>> {
    prop_oneof![
        Just(vec![]),
        Just(vec![Right]),
        Just(vec![Bottom]),
        Just(vec![Right, Bottom]),
        Just(vec![Bottom, Right]),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => scrollbars_strategy().prop_map(Op::SetScrollbars),
        2 => (0u8..4).prop_map(Op::Class),
        4 => (0u64..15).prop_map(Op::Advance),
        3 => (0u16..500, 0u16..500).prop_map(|(t, l)| Op::UserScroll(t, l)),
        1 => Just(Op::Detach),
        1 => Just(Op::Attach),
    ]
}

// ── Harness ─────────────────────────────────────────────────────────────

struct Harness {
    doc: Rc<HeadlessDocument>,
    widget: ScrollableWidget<HeadlessDocument>,
    notifications: Rc<Cell<u32>>,
    class: Option<String>,
}

impl Harness {
    fn new() -> Self {
        let doc = Rc::new(HeadlessDocument::new());
        let element = doc.create_element("enhanced-dom-scrollable");
        doc.append_child(doc.root(), element).expect("append");
        let widget =
            ScrollableWidget::new(Rc::clone(&doc), element, WidgetConfig::default()).expect("widget");
        let notifications = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notifications);
        doc.add_listener(
            element,
            EventKind::Scroll,
            ListenerOptions::bubble(),
            Rc::new(move |_: &mut DomEvent| counter.set(counter.get() + 1)),
        )
        .expect("listener");
        widget.on_attach().expect("attach");
        doc.flush_events();
        Self {
            doc,
            widget,
            notifications,
            class: None,
        }
    }

    fn apply(&mut self, op: &Op) -> Result<(), TestCaseError> {
        match op {
            Op::SetScrollbars(positions) => {
                self.widget
                    .set_scrollbars(positions.clone())
                    .map_err(|err| TestCaseError::fail(err.to_string()))?;
            }
            Op::Class(n) => {
                let next = format!("c{n}");
                self.widget
                    .attribute_changed("class", self.class.as_deref(), Some(&next))
                    .map_err(|err| TestCaseError::fail(err.to_string()))?;
                self.class = Some(next);
            }
            Op::Advance(ms) => self.doc.advance(Duration::from_millis(*ms)),
            Op::UserScroll(top, left) => {
                let before = self.notifications.get();
                if let Some(container) = self.widget.locate(Role::Container) {
                    self.doc.user_scroll(
                        container,
                        ScrollOffset::new(f64::from(*top), f64::from(*left)),
                    );
                    self.doc.flush_events();
                }
                prop_assert!(self.notifications.get() - before <= 1);
            }
            Op::Detach => self.widget.on_detach(),
            Op::Attach => {
                self.widget
                    .on_attach()
                    .map_err(|err| TestCaseError::fail(err.to_string()))?;
                self.doc.flush_events();
            }
        }
        Ok(())
    }

    fn check(&self) -> Result<(), TestCaseError> {
        for role in [Role::Container, Role::Right, Role::Bottom] {
            if let Some(node) = self.widget.locate(role) {
                prop_assert!(
                    self.doc.listener_count(node) <= 1,
                    "{role:?} has {} listeners",
                    self.doc.listener_count(node)
                );
            }
        }

        if !self.widget.is_attached() {
            for role in [Role::Container, Role::Right, Role::Bottom, Role::Content] {
                prop_assert_eq!(self.widget.bound_node(role), None);
            }
            return Ok(());
        }

        if self.widget.is_render_pending() {
            return Ok(());
        }

        let active = self.widget.scrollbars();
        prop_assert_eq!(
            self.widget.bound_node(Role::Container),
            self.widget.locate(Role::Container)
        );
        prop_assert_eq!(
            self.widget.bound_node(Role::Content),
            self.widget.locate(Role::Content)
        );
        for position in [Right, Bottom] {
            let role = Role::from(position);
            if active.contains(&position) {
                prop_assert!(self.widget.locate(role).is_some());
                prop_assert_eq!(self.widget.bound_node(role), self.widget.locate(role));
            } else {
                prop_assert!(!self.widget.is_registered(role));
                prop_assert_eq!(self.widget.bound_node(role), None);
                prop_assert_eq!(self.widget.locate(role), None);
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn bindings_follow_rendered_nodes(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let mut harness = Harness::new();
        harness.check()?;
        for op in &ops {
            harness.apply(op)?;
            harness.check()?;
        }
    }

    #[test]
    fn settled_widget_matches_final_scrollbars(
        ops in proptest::collection::vec(op_strategy(), 1..30),
        last in scrollbars_strategy(),
    ) {
        let mut harness = Harness::new();
        for op in &ops {
            harness.apply(op)?;
        }
        harness.apply(&Op::SetScrollbars(last.clone()))?;
        harness.apply(&Op::Attach)?;
        harness.doc.advance(Duration::from_millis(20));

        prop_assert_eq!(harness.widget.scrollbars(), last.clone());
        for position in [Right, Bottom] {
            let role = Role::from(position);
            prop_assert_eq!(
                harness.widget.bound_node(role).is_some(),
                last.contains(&position)
            );
        }
        harness.check()?;
    }
}
