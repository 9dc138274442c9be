//! High-level synchronization of feed categories into a local directory
//!
//! Every call re-reads the feed, resolves the requested entries and hands them
//! to a fresh [`Downloader`], so one sync call requests at most one token.

use crate::config::Config;
use crate::downloader::Downloader;
use crate::error::{Error, Result};
use crate::feed::{Feed, MatchingEntries};
use crate::types::DownloadResult;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use tracing::{info, warn};

/// Synchronizes feed categories into [`Config::output_dir`]
#[derive(Clone, Debug)]
pub struct SyncEngine {
    config: Config,
    client: reqwest::Client,
}

impl SyncEngine {
    /// Create an engine after validating `config`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = config.http.build_client()?;
        Ok(Self { config, client })
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Download every entry in `categories`, or only the latest per category
    ///
    /// Requested categories absent from the feed are left out of the result.
    /// The first failure aborts the call.
    pub async fn sync<I, S>(
        &self,
        categories: I,
        latest_only: bool,
    ) -> Result<HashMap<String, Vec<DownloadResult>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let feed = self.fetch_feed().await?;
        let matching = feed.matching_entries(categories, latest_only)?;
        self.download_all(matching).await
    }

    /// Like [`sync`](Self::sync), restricted to entries whose content item
    /// identifier is one of `content_item_identifiers`
    pub async fn sync_by_content_identifier<I, S, J, T>(
        &self,
        categories: I,
        content_item_identifiers: J,
        latest_only: bool,
    ) -> Result<HashMap<String, Vec<DownloadResult>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        J: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let feed = self.fetch_feed().await?;
        let matching = feed.matching_entries_by_content_identifier(
            categories,
            content_item_identifiers,
            latest_only,
        )?;
        self.download_all(matching).await
    }

    /// Download the latest entry of each category
    ///
    /// Requested categories absent from the feed are left out of the result,
    /// as with [`sync`](Self::sync).
    ///
    /// # Errors
    ///
    /// [`Error::Syndication`] if a returned category does not hold exactly
    /// one file.
    pub async fn sync_latest<I, S>(&self, categories: I) -> Result<HashMap<String, DownloadResult>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let downloaded = self.sync(categories, true).await?;

        let mut latest = HashMap::with_capacity(downloaded.len());
        for (category, results) in downloaded {
            let [result]: [DownloadResult; 1] =
                results.try_into().map_err(|found: Vec<DownloadResult>| {
                    Error::Syndication(format!(
                        "expected one latest file for category {}, found {}",
                        category,
                        found.len()
                    ))
                })?;
            latest.insert(category, result);
        }
        Ok(latest)
    }

    /// Download the latest entry of a single category
    ///
    /// # Errors
    ///
    /// [`Error::Syndication`] unless exactly one file for `category` results.
    pub async fn sync_latest_single(&self, category: &str) -> Result<DownloadResult> {
        let mut latest = self.sync_latest([category]).await?;
        if latest.len() != 1 {
            return Err(Error::Syndication(format!(
                "expected a result for category {} only, got {} categories",
                category,
                latest.len()
            )));
        }
        latest.remove(category).ok_or_else(|| {
            Error::Syndication(format!("no latest file for category {}", category))
        })
    }

    async fn fetch_feed(&self) -> Result<Feed> {
        Feed::fetch(&self.client, &self.config.feed_url).await
    }

    /// Materialize every resolved entry, keeping the per-category grouping
    async fn download_all(
        &self,
        matching: MatchingEntries,
    ) -> Result<HashMap<String, Vec<DownloadResult>>> {
        if matching.is_empty() {
            warn!(feed_url = %self.config.feed_url, "No entries matched the requested categories");
            return Ok(HashMap::new());
        }

        let total: usize = matching.values().map(|entries| entries.len()).sum();
        info!(
            categories = matching.len(),
            entries = total,
            max_concurrent = self.config.max_concurrent_downloads,
            output_dir = %self.config.output_dir.display(),
            "Starting downloads"
        );

        let downloader = Downloader::new(
            self.client.clone(),
            self.config.token_url.clone(),
            self.config.credentials.clone(),
        );
        let downloader = &downloader;
        let output_dir = self.config.output_dir.as_path();

        let jobs = matching.into_iter().flat_map(|(category, entries)| {
            entries
                .into_iter()
                .map(move |entry| (category.clone(), entry))
        });

        let downloaded: Vec<(String, DownloadResult)> = stream::iter(jobs)
            .map(|(category, mut entry)| async move {
                let result = downloader.ensure(&mut entry, output_dir).await?;
                Ok::<_, Error>((category, result))
            })
            .buffer_unordered(self.config.max_concurrent_downloads)
            .try_collect()
            .await?;

        let mut grouped: HashMap<String, Vec<DownloadResult>> = HashMap::new();
        for (category, result) in downloaded {
            grouped.entry(category).or_default().push(result);
        }

        let fresh = grouped
            .values()
            .flatten()
            .filter(|result| result.freshly_downloaded)
            .count();
        info!(files = total, freshly_downloaded = fresh, "Sync complete");

        Ok(grouped)
    }
}
