//! Property-based invariant tests for `SubscriptionTracker`.
//!
//! 1. At most one live subscription per role after any operation sequence
//! 2. A role's dispose always precedes its next attach
//! 3. Unchanged resolution never re-runs the hook
//! 4. The bound node always equals the last successful resolution

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use proptest::prelude::*;
use scrollable_runtime::{Dispose, HookError, SubscriptionTracker};

// ── Strategies ──────────────────────────────────────────────────────────

const ROLES: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    /// Point a role's locator at a node id (None = absent).
    Resolve(usize, Option<u8>),
    Refresh,
    Unregister(usize),
    Register(usize),
    DisposeAll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..ROLES, proptest::option::of(0u8..4)).prop_map(|(r, n)| Op::Resolve(r, n)),
        4 => Just(Op::Refresh),
        1 => (0..ROLES).prop_map(Op::Unregister),
        1 => (0..ROLES).prop_map(Op::Register),
        1 => Just(Op::DisposeAll),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Attach(usize, u8),
    Detach(usize, u8),
}

struct Harness {
    tracker: SubscriptionTracker<usize, u8>,
    locators: Vec<Rc<Cell<Option<u8>>>>,
    events: Rc<RefCell<Vec<Event>>>,
    live: Rc<RefCell<HashMap<usize, u32>>>,
}

impl Harness {
    fn new() -> Self {
        let mut harness = Self {
            tracker: SubscriptionTracker::new(),
            locators: (0..ROLES).map(|_| Rc::new(Cell::new(None))).collect(),
            events: Rc::default(),
            live: Rc::default(),
        };
        for role in 0..ROLES {
            harness.register(role);
        }
        harness
    }

    fn register(&mut self, role: usize) {
        let locator = Rc::clone(&self.locators[role]);
        let events = Rc::clone(&self.events);
        let live = Rc::clone(&self.live);
        self.tracker.register(
            role,
            move || locator.get(),
            move |node: &u8| -> Result<Dispose, HookError> {
                let node = *node;
                events.borrow_mut().push(Event::Attach(role, node));
                *live.borrow_mut().entry(role).or_default() += 1;
                let events = Rc::clone(&events);
                let live = Rc::clone(&live);
                Ok(Box::new(move || {
                    events.borrow_mut().push(Event::Detach(role, node));
                    *live.borrow_mut().entry(role).or_default() -= 1;
                }))
            },
        );
    }

    fn apply(&mut self, op: &Op) {
        match op {
            Op::Resolve(role, node) => self.locators[*role].set(*node),
            Op::Refresh => {
                self.tracker.refresh().expect("hooks never fail here");
            }
            Op::Unregister(role) => {
                self.tracker.unregister(role);
            }
            Op::Register(role) => self.register(*role),
            Op::DisposeAll => {
                self.tracker.dispose_all();
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 1. No duplicate subscriptions
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn at_most_one_live_subscription_per_role(ops in proptest::collection::vec(op_strategy(), 0..80)) {
        let mut harness = Harness::new();
        for op in &ops {
            harness.apply(op);
            for (role, count) in harness.live.borrow().iter() {
                prop_assert!(*count <= 1, "role {} has {} live subscriptions", role, count);
            }
        }
    }

    #[test]
    fn detach_precedes_reattach(ops in proptest::collection::vec(op_strategy(), 0..80)) {
        let mut harness = Harness::new();
        for op in &ops {
            harness.apply(op);
        }
        let mut attached: HashMap<usize, bool> = HashMap::new();
        for event in harness.events.borrow().iter() {
            match *event {
                Event::Attach(role, _) => {
                    prop_assert!(!attached.get(&role).copied().unwrap_or(false),
                        "role {} attached twice without detach", role);
                    attached.insert(role, true);
                }
                Event::Detach(role, _) => {
                    prop_assert!(attached.get(&role).copied().unwrap_or(false),
                        "role {} detached while unbound", role);
                    attached.insert(role, false);
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 2. Subscription stability
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeated_refresh_is_stable(
        nodes in proptest::collection::vec(proptest::option::of(0u8..4), ROLES),
        repeats in 1usize..6,
    ) {
        let mut harness = Harness::new();
        for (role, node) in nodes.iter().enumerate() {
            harness.locators[role].set(*node);
        }
        harness.tracker.refresh().expect("first refresh");
        let after_first = harness.events.borrow().len();

        for _ in 0..repeats {
            let summary = harness.tracker.refresh().expect("refresh");
            prop_assert_eq!(summary.attached, 0);
            prop_assert_eq!(summary.detached, 0);
        }
        prop_assert_eq!(harness.events.borrow().len(), after_first);
    }

    #[test]
    fn bound_node_tracks_last_resolution(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let mut harness = Harness::new();
        for op in &ops {
            harness.apply(op);
        }
        harness.tracker.refresh().expect("final refresh");
        for role in 0..ROLES {
            if harness.tracker.is_registered(&role) {
                prop_assert_eq!(
                    harness.tracker.bound_node(&role).copied(),
                    harness.locators[role].get()
                );
            } else {
                prop_assert_eq!(harness.tracker.bound_node(&role), None);
            }
        }
    }
}
