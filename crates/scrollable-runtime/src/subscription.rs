#![forbid(unsafe_code)]

//! Subscription tracking for nodes that are destroyed and recreated.
//!
//! A rendering engine is free to replace any node on any render pass, so a
//! listener attached to "the scroll container" silently goes stale the moment
//! the container is rebuilt. The tracker never caches nodes on behalf of its
//! callers. Instead each role is described by a locator (resolve the node
//! that currently plays the role) and a hook (attach to a node, returning the
//! matching detach).
//!
//! # How it works
//!
//! 1. [`SubscriptionTracker::register`] records a role's locator and hook.
//!    Nothing is attached yet.
//! 2. [`SubscriptionTracker::refresh`] resolves every locator and compares
//!    the result with the node the role is bound to:
//!    - same node: nothing happens, the existing subscription survives
//!    - different node: the old subscription is disposed, then the hook runs
//!      against the new node
//!    - no node: the old subscription is disposed and the role stays unbound
//! 3. [`SubscriptionTracker::unregister`] disposes and forgets a role.
//!
//! # Invariants
//!
//! 1. At most one live subscription per role.
//! 2. A role's dispose always runs before its hook runs again.
//! 3. A failing hook leaves its role unbound and does not stop the refresh
//!    of other roles. Failures are reported once all roles were processed.

use std::fmt;

use scrollable_core::HostError;

/// Detach callback returned by a hook.
pub type Dispose = Box<dyn FnOnce()>;

type Resolve<N> = Box<dyn Fn() -> Option<N>>;
type Hook<N> = Box<dyn FnMut(&N) -> Result<Dispose, HookError>>;

/// Why a hook could not attach.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("{0}")]
    Failed(String),
}

/// Hook failures collected during one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshError<K> {
    failures: Vec<(K, HookError)>,
    summary: RefreshSummary,
}

impl<K> RefreshError<K> {
    /// The roles that failed, in registration order, with their errors.
    #[must_use]
    pub fn failures(&self) -> &[(K, HookError)] {
        &self.failures
    }

    /// What the refresh did for the roles that succeeded.
    #[must_use]
    pub const fn summary(&self) -> RefreshSummary {
        self.summary
    }
}

impl<K: fmt::Debug> fmt::Display for RefreshError<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hook(s) failed to attach", self.failures.len())?;
        for (role, err) in &self.failures {
            write!(f, "; {role:?}: {err}")?;
        }
        Ok(())
    }
}

impl<K: fmt::Debug> std::error::Error for RefreshError<K> {}

/// Counters describing one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshSummary {
    /// Hooks that ran and bound a node.
    pub attached: usize,
    /// Subscriptions that were disposed.
    pub detached: usize,
    /// Roles whose node did not change.
    pub unchanged: usize,
}

struct Binding<N> {
    node: N,
    dispose: Dispose,
}

struct SubscriptionRecord<K, N> {
    role: K,
    resolve: Resolve<N>,
    hook: Hook<N>,
    bound: Option<Binding<N>>,
}

impl<K: fmt::Debug, N: fmt::Debug> SubscriptionRecord<K, N> {
    /// Dispose the current binding, if any. Returns whether one existed.
    fn unbind(&mut self) -> bool {
        match self.bound.take() {
            Some(binding) => {
                tracing::debug!(
                    target: "scrollable.tracker",
                    role = ?self.role,
                    node = ?binding.node,
                    "Detaching subscription"
                );
                (binding.dispose)();
                true
            }
            None => false,
        }
    }
}

/// Keeps role-keyed subscriptions synchronized with ephemeral nodes.
///
/// `K` identifies a role, `N` is the node handle type. Node handles are
/// compared with `PartialEq` on every refresh, so a handle type must compare
/// by identity.
pub struct SubscriptionTracker<K, N> {
    records: Vec<SubscriptionRecord<K, N>>,
}

impl<K, N> SubscriptionTracker<K, N>
where
    K: Clone + PartialEq + fmt::Debug,
    N: Clone + PartialEq + fmt::Debug,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Add or replace the subscription record for `role`.
    ///
    /// Replacing a bound record disposes the old subscription. The new hook
    /// is not run until the next [`Self::refresh`].
    pub fn register<R, H>(&mut self, role: K, resolve: R, hook: H)
    where
        R: Fn() -> Option<N> + 'static,
        H: FnMut(&N) -> Result<Dispose, HookError> + 'static,
    {
        let record = SubscriptionRecord {
            role: role.clone(),
            resolve: Box::new(resolve),
            hook: Box::new(hook),
            bound: None,
        };
        match self.records.iter_mut().find(|r| r.role == role) {
            Some(existing) => {
                existing.unbind();
                tracing::debug!(target: "scrollable.tracker", role = ?role, "Replacing role");
                *existing = record;
            }
            None => {
                tracing::debug!(target: "scrollable.tracker", role = ?role, "Registering role");
                self.records.push(record);
            }
        }
    }

    /// Dispose `role`'s subscription (if bound) and forget the role.
    ///
    /// Returns `false` if the role was not registered.
    pub fn unregister(&mut self, role: &K) -> bool {
        let Some(index) = self.records.iter().position(|r| &r.role == role) else {
            return false;
        };
        let mut record = self.records.remove(index);
        record.unbind();
        tracing::debug!(target: "scrollable.tracker", role = ?role, "Unregistered role");
        true
    }

    /// Re-resolve every role and rewire hooks whose node changed.
    pub fn refresh(&mut self) -> Result<RefreshSummary, RefreshError<K>> {
        let mut summary = RefreshSummary::default();
        let mut failures = Vec::new();

        for record in &mut self.records {
            let resolved = (record.resolve)();
            if let (Some(binding), Some(node)) = (record.bound.as_ref(), resolved.as_ref())
                && binding.node == *node
            {
                summary.unchanged += 1;
                continue;
            }

            if record.unbind() {
                summary.detached += 1;
            }

            let Some(node) = resolved else {
                continue;
            };

            match (record.hook)(&node) {
                Ok(dispose) => {
                    tracing::debug!(
                        target: "scrollable.tracker",
                        role = ?record.role,
                        node = ?node,
                        "Attached subscription"
                    );
                    record.bound = Some(Binding { node, dispose });
                    summary.attached += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        target: "scrollable.tracker",
                        role = ?record.role,
                        node = ?node,
                        error = %err,
                        "Hook failed; role left unbound"
                    );
                    failures.push((record.role.clone(), err));
                }
            }
        }

        tracing::trace!(
            target: "scrollable.tracker",
            attached = summary.attached,
            detached = summary.detached,
            unchanged = summary.unchanged,
            failed = failures.len(),
            "Refresh complete"
        );

        if failures.is_empty() {
            Ok(summary)
        } else {
            Err(RefreshError { failures, summary })
        }
    }

    /// Dispose every bound subscription, keeping registrations.
    ///
    /// Safe to call repeatedly.
    pub fn dispose_all(&mut self) -> usize {
        self.records
            .iter_mut()
            .map(SubscriptionRecord::unbind)
            .filter(|detached| *detached)
            .count()
    }

    #[must_use]
    pub fn is_registered(&self, role: &K) -> bool {
        self.records.iter().any(|r| &r.role == role)
    }

    /// The node `role` is currently bound to.
    #[must_use]
    pub fn bound_node(&self, role: &K) -> Option<&N> {
        self.records
            .iter()
            .find(|r| &r.role == role)
            .and_then(|r| r.bound.as_ref())
            .map(|b| &b.node)
    }

    /// Registered roles in registration order.
    pub fn roles(&self) -> impl Iterator<Item = &K> + '_ {
        self.records.iter().map(|r| &r.role)
    }

    /// Number of roles that currently hold a subscription.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.records.iter().filter(|r| r.bound.is_some()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<K, N> Default for SubscriptionTracker<K, N>
where
    K: Clone + PartialEq + fmt::Debug,
    N: Clone + PartialEq + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, N> fmt::Debug for SubscriptionTracker<K, N>
where
    K: fmt::Debug,
    N: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.records
                    .iter()
                    .map(|r| (&r.role, r.bound.as_ref().map(|b| &b.node))),
            )
            .finish()
    }
}

impl<K, N> Drop for SubscriptionTracker<K, N> {
    fn drop(&mut self) {
        for record in &mut self.records {
            if let Some(binding) = record.bound.take() {
                (binding.dispose)();
            }
        }
    }
}
