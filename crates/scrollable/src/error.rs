#![forbid(unsafe_code)]

//! Widget error types.

use scrollable_core::HostError;
use scrollable_runtime::RefreshError;

use crate::state::ScrollbarPosition;
use crate::sync::Role;

/// A serialized attribute that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    #[error("malformed scrollbars value {value:?}: {reason}")]
    MalformedScrollbars { value: String, reason: String },
    #[error("unknown scrollbar position {0:?}")]
    UnknownPosition(String),
    #[error("scrollbar position {0} listed more than once")]
    DuplicatePosition(ScrollbarPosition),
    #[error("{0:?} is not a numeric scroll offset")]
    InvalidOffset(String),
}

/// Errors surfaced by [`ScrollableWidget`](crate::ScrollableWidget).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WidgetError {
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    #[error("subscription refresh failed: {0}")]
    Refresh(#[from] RefreshError<Role>),
    #[error("render failed: {0}")]
    Render(#[from] HostError),
    #[error("invalid widget configuration: {}", .0.join("; "))]
    Config(Vec<String>),
}
