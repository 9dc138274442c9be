//! Syndication feed model: parsing and category-based entry resolution.
//!
//! A [`Feed`] is parsed once from an Atom document carrying NCTS syndication
//! extensions and is read-only afterwards. Callers ask it for the entries in a
//! set of categories, optionally reduced to the latest version per category
//! (see [`crate::version`]).

mod index;
mod parser;

pub use index::CategoryIndex;
pub use parser::{ATOM_NAMESPACE, NCTS_NAMESPACE};

use crate::error::{Error, Result};
use crate::types::Entry;
use crate::version;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Entries resolved for a request, keyed by category
pub type MatchingEntries = HashMap<String, HashSet<Entry>>;

/// A parsed syndication feed
#[derive(Clone, Debug, Default)]
pub struct Feed {
    index: CategoryIndex,
}

impl Feed {
    /// Parse a feed document
    ///
    /// # Errors
    ///
    /// Returns [`Error::Feed`] if the document is not a well-formed Atom feed,
    /// if any entry lacks exactly one category or exactly one link, if a
    /// required field is missing, or if two entries share an ID.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut index = CategoryIndex::new();
        for entry in parser::parse_entries(xml)? {
            index.insert(entry)?;
        }
        Ok(Self { index })
    }

    /// Retrieve and parse the feed at `url`
    ///
    /// `file://` URLs are read from the local filesystem; anything else is
    /// fetched with a plain `GET`.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self> {
        info!(feed_url = %url, "Reading syndication feed");

        let parsed = url::Url::parse(url).map_err(|e| Error::Config {
            message: format!("invalid feed URL '{}': {}", url, e),
            key: Some("feed_url".to_string()),
        })?;

        let content = if parsed.scheme() == "file" {
            let path = parsed.to_file_path().map_err(|_| Error::Config {
                message: format!("feed URL '{}' is not a local file path", url),
                key: Some("feed_url".to_string()),
            })?;
            tokio::fs::read_to_string(&path).await?
        } else {
            let response = client.get(parsed).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::Syndication(format!(
                    "feed {} returned HTTP {}",
                    url,
                    status.as_u16()
                )));
            }
            response.text().await?
        };

        let feed = Self::parse(&content)?;

        info!(feed_url = %url, entries = feed.len(), "Feed successfully read");
        for (category, entries) in feed.index.iter() {
            info!(category, entries = entries.len(), "Category entry count");
        }

        Ok(feed)
    }

    /// The underlying category index
    pub fn index(&self) -> &CategoryIndex {
        &self.index
    }

    /// Names of the categories present in the feed
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.index.categories()
    }

    /// All entries in `category`, if the category occurs in the feed
    pub fn entries(&self, category: &str) -> Option<&HashSet<Entry>> {
        self.index.get(category)
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if the feed has no entries
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Entries in the requested categories
    ///
    /// Only categories that occur in the feed appear in the result; a
    /// requested category the feed does not contain is silently omitted. With
    /// `latest_only` each category is reduced to its single greatest version.
    ///
    /// # Errors
    ///
    /// Any [`Error::Version`] raised while picking the latest entry of a
    /// category aborts the whole call.
    pub fn matching_entries<I, S>(&self, categories: I, latest_only: bool) -> Result<MatchingEntries>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let categories = to_set(categories);
        self.resolve(&categories, latest_only, |_| true)
    }

    /// Entries in the requested categories whose content item identifier is one
    /// of `content_item_identifiers`
    ///
    /// Same contract as [`matching_entries`](Self::matching_entries). A
    /// category left without entries by the identifier filter is omitted.
    pub fn matching_entries_by_content_identifier<I, S, J, T>(
        &self,
        categories: I,
        content_item_identifiers: J,
        latest_only: bool,
    ) -> Result<MatchingEntries>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        J: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let categories = to_set(categories);
        let identifiers = to_set(content_item_identifiers);
        self.resolve(&categories, latest_only, |entry| {
            identifiers.contains(&entry.content_item_identifier)
        })
    }

    /// The entry with the greatest version in `category`
    ///
    /// # Errors
    ///
    /// [`Error::Syndication`] if the category does not occur in the feed, or
    /// any comparison error from [`version::compare_entries`].
    pub fn latest_entry(&self, category: &str) -> Result<Entry> {
        let mut matching = self.matching_entries([category], true)?;
        matching
            .remove(category)
            .and_then(|entries| entries.into_iter().next())
            .ok_or_else(|| {
                Error::Syndication(format!("no entries in feed for category {}", category))
            })
    }

    fn resolve<F>(
        &self,
        categories: &HashSet<String>,
        latest_only: bool,
        filter: F,
    ) -> Result<MatchingEntries>
    where
        F: Fn(&Entry) -> bool,
    {
        let mut matching = MatchingEntries::new();

        for (category, entries) in self.index.iter() {
            if !categories.contains(category) {
                continue;
            }

            let selected: HashSet<Entry> = if latest_only {
                version::latest(entries.iter().filter(|entry| filter(entry)))?
                    .into_iter()
                    .cloned()
                    .collect()
            } else {
                entries.iter().filter(|entry| filter(entry)).cloned().collect()
            };

            if selected.is_empty() {
                continue;
            }

            debug!(
                category,
                selected = selected.len(),
                available = entries.len(),
                latest_only,
                "Resolved category entries"
            );
            matching.insert(category.to_string(), selected);
        }

        Ok(matching)
    }
}

fn to_set<I, S>(items: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect()
}
