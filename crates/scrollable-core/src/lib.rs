#![forbid(unsafe_code)]

//! Core: node handles, DOM events, geometry, virtual nodes, and host traits.
//!
//! # Role in the workspace
//! `scrollable-core` is the boundary layer. It names the things the widget
//! consumes from its environment (a document, timers, a rendering engine, a
//! stylesheet repository) without binding to any concrete environment.
//!
//! # Primary responsibilities
//! - **NodeRef**: opaque, identity-compared handles to host-owned nodes.
//! - **DomEvent**: scroll/change events with capture, target, and bubble phases.
//! - **VNode**: the attribute-bag tree handed to the rendering engine.
//! - **Host traits**: [`HostDocument`], [`TimerHost`], [`RenderingEngine`],
//!   [`StylesheetRepository`], bundled as [`Host`].
//!
//! # How it fits in the system
//! `scrollable-runtime` builds generic lifecycle primitives on these types,
//! `scrollable-web` implements the host traits headlessly, and `scrollable`
//! wires everything into the widget.

pub mod event;
pub mod geometry;
pub mod host;
pub mod node;
pub mod vnode;

pub use event::{DomEvent, EventKind, EventPhase, Listener, ListenerOptions};
pub use geometry::{Axis, ScrollOffset, Size, px};
pub use host::{
    Host, HostDocument, HostError, RenderingEngine, SizeCallback, StylesheetRepository, TimerHost,
};
pub use node::{ListenerId, NodeRef, ObserverId, TimerId};
pub use vnode::{AttrValue, VNode};
