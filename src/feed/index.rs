//! Category-indexed storage of parsed feed entries

use crate::error::{FeedError, Result};
use crate::types::Entry;
use std::collections::{HashMap, HashSet};

/// Entries grouped by category, unique by entry ID across the whole feed
#[derive(Clone, Debug, Default)]
pub struct CategoryIndex {
    categories: HashMap<String, HashSet<Entry>>,
    ids: HashSet<String>,
}

impl CategoryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry under its category
    ///
    /// # Errors
    ///
    /// [`FeedError::DuplicateEntry`] if an entry with the same ID is already
    /// indexed, in any category. The index is left unchanged.
    pub fn insert(&mut self, entry: Entry) -> Result<()> {
        if !self.ids.insert(entry.id.clone()) {
            return Err(FeedError::DuplicateEntry { id: entry.id }.into());
        }
        self.categories
            .entry(entry.category.clone())
            .or_default()
            .insert(entry);
        Ok(())
    }

    /// Entries filed under `category`
    pub fn get(&self, category: &str) -> Option<&HashSet<Entry>> {
        self.categories.get(category)
    }

    /// True if at least one entry is filed under `category`
    pub fn contains_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// Names of all categories present
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Iterate over `(category, entries)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HashSet<Entry>)> {
        self.categories
            .iter()
            .map(|(category, entries)| (category.as_str(), entries))
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if no entries are indexed
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
