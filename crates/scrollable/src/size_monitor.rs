#![forbid(unsafe_code)]

//! Content size to stylesheet variables.
//!
//! The proxy controls size their thumbs from the total scrollable extent.
//! [`ContentSizeMonitor`] watches the sizer node and writes its scroll
//! height under the right scrollbar's selector and its scroll width under
//! the bottom scrollbar's selector. Data only flows from layout into styles;
//! nothing here touches scroll positions.
//!
//! The sizer is rebuilt whenever the patcher replaces it, so the observation
//! is kept in a [`SubscriptionTracker`] and re-armed after every render.

use std::fmt;
use std::rc::{Rc, Weak};

use scrollable_core::{Host, HostDocument, NodeRef, Size, StylesheetRepository, px};
use scrollable_runtime::{Dispose, HookError, RefreshError, RefreshSummary, SubscriptionTracker};

use crate::config::WidgetConfig;
use crate::state::ScrollbarPosition;
use crate::sync::{Locator, Role};

/// Where size variables are written.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StyleTarget {
    sheet: String,
    right_selector: String,
    bottom_selector: String,
    variable: String,
}

impl StyleTarget {
    fn from_config(config: &WidgetConfig) -> Self {
        Self {
            sheet: config.stylesheet.clone(),
            right_selector: config.scrollbar_selector(ScrollbarPosition::Right),
            bottom_selector: config.scrollbar_selector(ScrollbarPosition::Bottom),
            variable: config.variables.scroll_size.clone(),
        }
    }

    fn write<S: StylesheetRepository + ?Sized>(&self, styles: &S, size: Size) {
        styles.set_property(&self.sheet, &self.right_selector, &self.variable, &px(size.height));
        styles.set_property(&self.sheet, &self.bottom_selector, &self.variable, &px(size.width));
    }
}

/// Keeps a size observation on the current content node.
pub struct ContentSizeMonitor<H: Host + 'static> {
    tracker: SubscriptionTracker<Role, NodeRef>,
    locator: Locator<H>,
}

impl<H: Host + 'static> ContentSizeMonitor<H> {
    #[must_use]
    pub fn new(host: &Rc<H>, root: NodeRef, config: &WidgetConfig) -> Self {
        let locator = Locator::new(host, root, config, Role::Content);
        let target = Rc::new(StyleTarget::from_config(config));
        let weak = Rc::downgrade(host);
        let resolve = locator.clone();

        let mut tracker = SubscriptionTracker::new();
        tracker.register(
            Role::Content,
            move || resolve.resolve(),
            move |node: &NodeRef| {
                let host = weak
                    .upgrade()
                    .ok_or_else(|| HookError::Failed("host document dropped".into()))?;
                let styles: Weak<H> = Weak::clone(&weak);
                let target = Rc::clone(&target);
                let id = host.observe_size(
                    *node,
                    Rc::new(move |observed: NodeRef, size: Size| {
                        let Some(styles) = styles.upgrade() else {
                            return;
                        };
                        tracing::debug!(
                            target: "scrollable.size",
                            node = %observed,
                            width = size.width,
                            height = size.height,
                            "Content resized"
                        );
                        target.write(&*styles, size);
                    }),
                )?;
                let host = Weak::clone(&weak);
                let dispose: Dispose = Box::new(move || {
                    if let Some(host) = host.upgrade() {
                        host.unobserve(id);
                    }
                });
                Ok(dispose)
            },
        );

        Self { tracker, locator }
    }

    /// Observe the current content node, replacing a stale observation.
    pub fn rearm(&mut self) -> Result<RefreshSummary, RefreshError<Role>> {
        self.tracker.refresh()
    }

    /// Stop observing. Idempotent.
    pub fn stop(&mut self) -> bool {
        self.tracker.dispose_all() > 0
    }

    #[must_use]
    pub fn observed_node(&self) -> Option<NodeRef> {
        self.tracker.bound_node(&Role::Content).copied()
    }

    /// The node currently playing the content role, observed or not.
    #[must_use]
    pub fn content(&self) -> Option<NodeRef> {
        self.locator.resolve()
    }
}

impl<H: Host + 'static> fmt::Debug for ContentSizeMonitor<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentSizeMonitor")
            .field("locator", &self.locator)
            .field("observed", &self.observed_node())
            .finish()
    }
}
