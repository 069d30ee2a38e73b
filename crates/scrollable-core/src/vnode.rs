#![forbid(unsafe_code)]

//! Attribute-bag trees handed to the rendering engine.
//!
//! A [`VNode`] describes what a subtree should look like after a render
//! pass. The rendering engine owns the mapping from descriptions to real
//! nodes and decides which nodes survive a pass and which are recreated.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A primitive attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttrValue {
    /// Serialized attribute form. `false` means the attribute is absent and
    /// `true` renders as an empty (present) attribute.
    #[must_use]
    pub fn to_attribute_string(&self) -> Option<String> {
        match self {
            Self::Bool(false) => None,
            Self::Bool(true) => Some(String::new()),
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A described element: tag, attributes, children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VNode {
    pub tag: String,
    pub attributes: BTreeMap<String, AttrValue>,
    pub children: Vec<VNode>,
}

impl VNode {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder: set an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: set every attribute in `attributes`, later entries winning.
    #[must_use]
    pub fn attrs<K, V>(mut self, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<AttrValue>,
    {
        for (name, value) in attributes {
            self.attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Builder: append a child.
    #[must_use]
    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: append several children.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Attributes in serialized form, dropping absent booleans.
    #[must_use]
    pub fn attribute_strings(&self) -> BTreeMap<String, String> {
        self.attributes
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_attribute_string()
                    .map(|rendered| (name.clone(), rendered))
            })
            .collect()
    }

    /// Depth-first search, including `self`.
    #[must_use]
    pub fn find(&self, predicate: &dyn Fn(&VNode) -> bool) -> Option<&VNode> {
        if predicate(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(predicate))
    }
}
