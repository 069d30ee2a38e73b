#![forbid(unsafe_code)]

//! Per-instance widget configuration.
//!
//! Everything a widget instance needs to know about its own markup (tag
//! names, section identifiers, CSS class and variable names, the stylesheet
//! it registers) plus its timing and default state lives in one
//! [`WidgetConfig`] injected at construction. Two widgets built from
//! different configs share nothing.
//!
//! # Loading
//!
//! ```toml
//! coalescing_window_ms = 16
//! default_scrollbars = ["right"]
//!
//! [classes]
//! scrollable = "viewport"
//! ```
//!
//! ```rust,ignore
//! let config = WidgetConfig::from_toml_str(toml)?;
//! let config = WidgetConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! `WidgetConfig::default()` reproduces the stock markup: sections under
//! `urn:enhanced-dom:scrollable`, a 10 ms coalescing window, and both
//! scrollbars (bottom, right) enabled.

use core::time::Duration;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::state::ScrollbarPosition;

/// Rendered parts of the widget, each tagged with a section identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Wrapper,
    RightScrollbar,
    BottomScrollbar,
    ScrollSizer,
    ScrollContainer,
}

impl Section {
    pub const ALL: [Self; 5] = [
        Self::Wrapper,
        Self::RightScrollbar,
        Self::BottomScrollbar,
        Self::ScrollSizer,
        Self::ScrollContainer,
    ];

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Wrapper => "wrapper",
            Self::RightScrollbar => "right_scrollbar",
            Self::BottomScrollbar => "bottom_scrollbar",
            Self::ScrollSizer => "scroll_sizer",
            Self::ScrollContainer => "scroll_container",
        }
    }

    /// The proxy section for a scrollbar position.
    #[must_use]
    pub const fn scrollbar(position: ScrollbarPosition) -> Self {
        match position {
            ScrollbarPosition::Right => Self::RightScrollbar,
            ScrollbarPosition::Bottom => Self::BottomScrollbar,
        }
    }
}

/// CSS class names used by the template and the size variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    pub scrollable: String,
    pub scrollable_bottom: String,
    pub scrollable_right: String,
    pub scrollable_both: String,
    pub main: String,
    pub window: String,
    pub right: String,
    pub bottom: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            scrollable: "scrollable".into(),
            scrollable_bottom: "scrollable-bottom".into(),
            scrollable_right: "scrollable-right".into(),
            scrollable_both: "scrollable-both".into(),
            main: "main".into(),
            window: "window".into(),
            right: "right".into(),
            bottom: "bottom".into(),
        }
    }
}

/// CSS custom property names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CssVariables {
    /// Total scrollable extent, consumed by the proxy controls.
    pub scroll_size: String,
    /// Gap reserved between the viewport and its scrollbars.
    pub scrollable_gap: String,
}

impl Default for CssVariables {
    fn default() -> Self {
        Self {
            scroll_size: "--enhanced-dom-scrollbar-scroll-size".into(),
            scrollable_gap: "--enhanced-dom-scrollable-gap".into(),
        }
    }
}

/// Configuration for one widget instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Tag name the host framework registers the widget under.
    pub tag: String,
    /// Tag name of the proxy scrollbar controls.
    pub proxy_tag: String,
    /// Attribute carrying section identifiers on rendered nodes.
    pub section_attribute: String,
    /// Prefix of every section identifier.
    pub urn_prefix: String,
    /// Stylesheet registered once per widget and targeted by size variables.
    pub stylesheet: String,
    pub classes: ClassNames,
    pub variables: CssVariables,
    /// Trailing-edge render coalescing window, in milliseconds.
    pub coalescing_window_ms: u64,
    /// Scrollbars active on a fresh widget and after `scrollbars` is removed.
    pub default_scrollbars: Vec<ScrollbarPosition>,
    /// Attributes whose changes the widget reacts to.
    pub observed_attributes: Vec<String>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            tag: "enhanced-dom-scrollable".into(),
            proxy_tag: "enhanced-dom-scrollbar".into(),
            section_attribute: "data-section-id".into(),
            urn_prefix: "urn:enhanced-dom:scrollable".into(),
            stylesheet: "@enhanced-dom/ScrollableWebComponent".into(),
            classes: ClassNames::default(),
            variables: CssVariables::default(),
            coalescing_window_ms: 10,
            default_scrollbars: vec![ScrollbarPosition::Bottom, ScrollbarPosition::Right],
            observed_attributes: vec!["scrollbars".into(), "class".into(), "style".into()],
        }
    }
}

impl WidgetConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate the configuration.
    ///
    /// Returns a list of problems. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("tag", &self.tag),
            ("proxy_tag", &self.proxy_tag),
            ("section_attribute", &self.section_attribute),
            ("urn_prefix", &self.urn_prefix),
            ("stylesheet", &self.stylesheet),
            ("classes.right", &self.classes.right),
            ("classes.bottom", &self.classes.bottom),
            ("classes.scrollable", &self.classes.scrollable),
            ("variables.scroll_size", &self.variables.scroll_size),
            ("variables.scrollable_gap", &self.variables.scrollable_gap),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{field} must not be empty"));
            }
        }

        // Custom elements require a hyphenated name.
        if !self.tag.contains('-') {
            errors.push(format!("tag must contain a hyphen, got {:?}", self.tag));
        }

        for (field, value) in [
            ("variables.scroll_size", &self.variables.scroll_size),
            ("variables.scrollable_gap", &self.variables.scrollable_gap),
        ] {
            if !value.starts_with("--") {
                errors.push(format!("{field} must start with \"--\", got {value:?}"));
            }
        }

        if self.coalescing_window_ms == 0 {
            errors.push("coalescing_window_ms must be > 0".into());
        }

        for (index, position) in self.default_scrollbars.iter().enumerate() {
            if self.default_scrollbars[..index].contains(position) {
                errors.push(format!("default_scrollbars lists {position} more than once"));
            }
        }

        if !self.observed_attributes.iter().any(|name| name == "scrollbars") {
            errors.push("observed_attributes must include \"scrollbars\"".into());
        }

        errors
    }

    /// Section identifier of `section`, e.g. `urn:enhanced-dom:scrollable:wrapper`.
    #[must_use]
    pub fn section_id(&self, section: Section) -> String {
        format!("{}:{}", self.urn_prefix, section.slug())
    }

    #[must_use]
    pub const fn coalescing_window(&self) -> Duration {
        Duration::from_millis(self.coalescing_window_ms)
    }

    #[must_use]
    pub fn observes(&self, attribute: &str) -> bool {
        self.observed_attributes.iter().any(|name| name == attribute)
    }

    /// Class selector of the wrapper, scoping the gap variable.
    #[must_use]
    pub fn wrapper_selector(&self) -> String {
        format!(".{}", self.classes.scrollable)
    }

    /// Class selector scoping the size variable for a proxy control.
    #[must_use]
    pub fn scrollbar_selector(&self, position: ScrollbarPosition) -> String {
        match position {
            ScrollbarPosition::Right => format!(".{}", self.classes.right),
            ScrollbarPosition::Bottom => format!(".{}", self.classes.bottom),
        }
    }
}

/// Errors that can occur when loading a widget configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[source] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[source] serde_json::Error),
}
