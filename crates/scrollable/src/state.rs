#![forbid(unsafe_code)]

//! The attribute bag the template is rendered from.
//!
//! [`WidgetState`] is the single source of truth for a render pass: which
//! scrollbars are active, the pass-through attributes delegated to the
//! wrapper, and the container identifier that binds each proxy control to
//! its viewport.
//!
//! # Invariants
//!
//! 1. The container identifier is fixed at construction.
//! 2. Active scrollbars are unique and keep the order they were given in.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use scrollable_core::{AttrValue, Axis};
use serde::{Deserialize, Serialize};

use crate::error::AttributeError;

/// Where a proxy scrollbar sits relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollbarPosition {
    Right,
    Bottom,
}

impl ScrollbarPosition {
    pub const ALL: [Self; 2] = [Self::Right, Self::Bottom];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Bottom => "bottom",
        }
    }

    /// The scroll axis this scrollbar mirrors.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Right => Axis::Vertical,
            Self::Bottom => Axis::Horizontal,
        }
    }
}

impl fmt::Display for ScrollbarPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrollbarPosition {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "right" => Ok(Self::Right),
            "bottom" => Ok(Self::Bottom),
            other => Err(AttributeError::UnknownPosition(other.to_owned())),
        }
    }
}

/// Parse a serialized `scrollbars` attribute, e.g. `["bottom","right"]`.
pub fn parse_scrollbars(value: &str) -> Result<Vec<ScrollbarPosition>, AttributeError> {
    let names: Vec<String> =
        serde_json::from_str(value).map_err(|err| AttributeError::MalformedScrollbars {
            value: value.to_owned(),
            reason: err.to_string(),
        })?;
    let positions = names
        .iter()
        .map(|name| name.parse())
        .collect::<Result<Vec<ScrollbarPosition>, _>>()?;
    check_unique(&positions)?;
    Ok(positions)
}

/// Serialize scrollbars to their attribute form.
#[must_use]
pub fn encode_scrollbars(positions: &[ScrollbarPosition]) -> String {
    let names: Vec<&str> = positions.iter().map(|p| p.as_str()).collect();
    serde_json::Value::from(names).to_string()
}

fn check_unique(positions: &[ScrollbarPosition]) -> Result<(), AttributeError> {
    for (index, position) in positions.iter().enumerate() {
        if positions[..index].contains(position) {
            return Err(AttributeError::DuplicatePosition(*position));
        }
    }
    Ok(())
}

/// Parse a scroll offset the way HTML attribute integers are read: leading
/// whitespace and sign, then digits up to the first non-digit.
pub fn parse_offset(value: &str) -> Result<f64, AttributeError> {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Err(AttributeError::InvalidOffset(value.to_owned()));
    }
    let magnitude: f64 = rest[..digits]
        .parse()
        .map_err(|_| AttributeError::InvalidOffset(value.to_owned()))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// What changed when the active scrollbars were replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollbarsDelta {
    pub added: Vec<ScrollbarPosition>,
    pub removed: Vec<ScrollbarPosition>,
}

impl ScrollbarsDelta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Render input for one widget instance.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState {
    scrollbars: Vec<ScrollbarPosition>,
    container_id: String,
    delegated: BTreeMap<String, AttrValue>,
}

impl WidgetState {
    /// A state with the given container identifier and active scrollbars.
    pub fn new(
        container_id: impl Into<String>,
        scrollbars: Vec<ScrollbarPosition>,
    ) -> Result<Self, AttributeError> {
        check_unique(&scrollbars)?;
        Ok(Self {
            scrollbars,
            container_id: container_id.into(),
            delegated: BTreeMap::new(),
        })
    }

    /// A state with a freshly generated container identifier.
    pub fn with_generated_id(scrollbars: Vec<ScrollbarPosition>) -> Result<Self, AttributeError> {
        Self::new(uuid::Uuid::new_v4().to_string(), scrollbars)
    }

    #[must_use]
    pub fn scrollbars(&self) -> &[ScrollbarPosition] {
        &self.scrollbars
    }

    #[must_use]
    pub fn is_active(&self, position: ScrollbarPosition) -> bool {
        self.scrollbars.contains(&position)
    }

    /// Replace the active scrollbars. On error the state is unchanged.
    pub fn set_scrollbars(
        &mut self,
        scrollbars: Vec<ScrollbarPosition>,
    ) -> Result<ScrollbarsDelta, AttributeError> {
        check_unique(&scrollbars)?;
        let delta = ScrollbarsDelta {
            added: scrollbars
                .iter()
                .filter(|p| !self.scrollbars.contains(p))
                .copied()
                .collect(),
            removed: self
                .scrollbars
                .iter()
                .filter(|p| !scrollbars.contains(p))
                .copied()
                .collect(),
        };
        self.scrollbars = scrollbars;
        Ok(delta)
    }

    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    #[must_use]
    pub fn delegated(&self) -> &BTreeMap<String, AttrValue> {
        &self.delegated
    }

    /// Set (`Some`) or remove (`None`) a pass-through attribute. Returns
    /// whether the bag changed.
    pub fn set_delegated(&mut self, name: &str, value: Option<&str>) -> bool {
        match value {
            Some(value) => {
                let value = AttrValue::from(value);
                if self.delegated.get(name) == Some(&value) {
                    return false;
                }
                self.delegated.insert(name.to_owned(), value);
                true
            }
            None => self.delegated.remove(name).is_some(),
        }
    }
}
