#![forbid(unsafe_code)]

//! Named stylesheets holding scoped CSS custom properties.

use std::collections::{BTreeMap, BTreeSet};

use scrollable_core::StylesheetRepository;

use crate::document::HeadlessDocument;

type PropertyKey = (String, String, String);

/// Registered sheets and the variables written into them.
#[derive(Debug, Default, Clone)]
pub struct StylesheetStore {
    sheets: BTreeSet<String>,
    properties: BTreeMap<PropertyKey, String>,
    writes: u64,
}

impl StylesheetStore {
    /// Register `sheet`. Returns `false` if it was already registered.
    pub fn register(&mut self, sheet: &str) -> bool {
        self.sheets.insert(sheet.to_owned())
    }

    #[must_use]
    pub fn is_registered(&self, sheet: &str) -> bool {
        self.sheets.contains(sheet)
    }

    pub fn sheets(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(String::as_str)
    }

    /// Store a variable under `selector` in `sheet`. Writing to a sheet that
    /// was never registered registers it.
    pub fn set(&mut self, sheet: &str, selector: &str, variable: &str, value: &str) {
        self.sheets.insert(sheet.to_owned());
        self.properties.insert(
            (sheet.to_owned(), selector.to_owned(), variable.to_owned()),
            value.to_owned(),
        );
        self.writes += 1;
    }

    #[must_use]
    pub fn property(&self, sheet: &str, selector: &str, variable: &str) -> Option<&str> {
        self.properties
            .get(&(sheet.to_owned(), selector.to_owned(), variable.to_owned()))
            .map(String::as_str)
    }

    /// Total writes, including ones that did not change the stored value.
    #[must_use]
    pub const fn write_count(&self) -> u64 {
        self.writes
    }
}

impl StylesheetRepository for HeadlessDocument {
    fn set_property(&self, sheet: &str, selector: &str, variable: &str, value: &str) {
        tracing::trace!(target: "scrollable.host", sheet, selector, variable, value, "Style property");
        self.stylesheets
            .borrow_mut()
            .set(sheet, selector, variable, value);
    }
}
