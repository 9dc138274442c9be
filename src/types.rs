//! Core types for syndication-client

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// One artefact advertised by the syndication feed
///
/// Identity is the feed entry `id` alone: two `Entry` values with the same ID
/// are equal and hash the same regardless of their other fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entry {
    /// Atom entry ID, unique within a feed
    pub id: String,

    /// Entry title, if the feed provides one
    pub title: Option<String>,

    /// Identifier shared by every version of the same logical artefact
    pub content_item_identifier: String,

    /// Version of the artefact (integer, versioned URI or semantic version)
    pub content_item_version: String,

    /// Category term the entry is filed under
    pub category: String,

    /// Scheme the category term belongs to
    pub category_scheme: Option<String>,

    /// Hex-encoded SHA-256 of the artefact
    pub content_hash: String,

    /// Artefact size in bytes
    pub content_length: u64,

    /// Where the artefact bytes are fetched from
    pub source_url: String,

    /// MIME type advertised on the link
    pub media_type: Option<String>,

    /// Local copy, set once a download has been attempted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_file: Option<PathBuf>,
}

impl Entry {
    /// True if every field except `local_file` is identical
    pub fn same_fields(&self, other: &Entry) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.content_item_identifier == other.content_item_identifier
            && self.content_item_version == other.content_item_version
            && self.category == other.category
            && self.category_scheme == other.category_scheme
            && self.content_hash == other.content_hash
            && self.content_length == other.content_length
            && self.source_url == other.source_url
            && self.media_type == other.media_type
    }

    /// Last path segment of the source URL, used as the local file name
    ///
    /// Query strings and fragments are ignored. Returns `None` when the URL has
    /// no usable final segment (e.g. it ends with `/`).
    pub fn file_name(&self) -> Option<String> {
        let name = match url::Url::parse(&self.source_url) {
            Ok(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(|segment| segment.to_string()),
            Err(_) => self
                .source_url
                .split(['?', '#'])
                .next()
                .and_then(|path| path.rsplit('/').next())
                .map(|segment| segment.to_string()),
        }?;

        if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
            return None;
        }
        Some(name)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} {} in {})",
            self.id, self.content_item_identifier, self.content_item_version, self.category
        )
    }
}

/// Outcome of materializing one entry into an output directory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    /// ID of the entry this file was produced for
    pub entry_id: String,

    /// Local file holding the artefact
    pub path: PathBuf,

    /// True if bytes were fetched from the network in this call,
    /// false if a valid local copy was reused
    pub freshly_downloaded: bool,
}

impl DownloadResult {
    /// Local file holding the artefact
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the local copy
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}
