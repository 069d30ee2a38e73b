#![forbid(unsafe_code)]

//! A viewport over oversized content with proxy scrollbars that mirror and
//! drive its scroll position.
//!
//! # Key Components
//!
//! - [`ScrollableWidget`] - lifecycle hooks and the public surface
//!   (`scrollbars`, `scroll_top`, `scroll_left`, attribute changes)
//! - [`ScrollSyncEngine`] - loop-free container/proxy synchronization hooks
//! - [`ContentSizeMonitor`] - content size to stylesheet variables
//! - [`WidgetState`] - the attribute bag every render pass is built from
//! - [`WidgetConfig`] - per-instance markup, timing, and defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use scrollable::{ScrollableWidget, WidgetConfig};
//! use scrollable_web::HeadlessDocument;
//!
//! let doc = Rc::new(HeadlessDocument::new());
//! let element = doc.create_element("enhanced-dom-scrollable");
//! doc.append_child(doc.root(), element)?;
//!
//! let widget = ScrollableWidget::new(Rc::clone(&doc), element, WidgetConfig::default())?;
//! widget.on_attach()?;
//! widget.set_scroll_top(150.0);
//! doc.flush_events();
//! ```

pub mod config;
pub mod error;
pub mod size_monitor;
pub mod state;
pub mod sync;
pub mod template;
pub mod widget;

pub use config::{ClassNames, ConfigError, CssVariables, Section, WidgetConfig};
pub use error::{AttributeError, WidgetError};
pub use size_monitor::ContentSizeMonitor;
pub use state::{
    ScrollbarPosition, ScrollbarsDelta, WidgetState, encode_scrollbars, parse_offset,
    parse_scrollbars,
};
pub use sync::{Locator, Role, ScrollSyncEngine};
pub use template::render_tree;
pub use widget::ScrollableWidget;
