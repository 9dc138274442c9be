//! Error types for syndication-client
//!
//! This module provides the error handling for the library:
//! - Domain-specific error types (feed format, version comparison, downloads)
//! - Context information (entry ID, file path, observed and expected hashes)
//!
//! Every failure in the crate propagates to the caller; nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for syndication-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for syndication-client
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "feed_url")
        key: Option<String>,
    },

    /// The syndication feed could not be read as a valid feed document
    #[error("feed format error: {0}")]
    Feed(#[from] FeedError),

    /// Two entries could not be ordered by version
    #[error("version comparison error: {0}")]
    Version(#[from] VersionError),

    /// Download-related error
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// A bearer token could not be obtained from the token endpoint
    #[error("authentication error: {message}")]
    Authentication {
        /// What went wrong while talking to the token endpoint
        message: String,
    },

    /// The feed did not contain what the caller asked for
    #[error("syndication error: {0}")]
    Syndication(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build an [`Error::Authentication`] from anything displayable
    pub(crate) fn authentication(message: impl std::fmt::Display) -> Self {
        Error::Authentication {
            message: message.to_string(),
        }
    }
}

/// Feed parsing and integrity errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// The document is not well-formed XML
    #[error("cannot parse syndication feed: {0}")]
    Xml(String),

    /// The document root is not an Atom feed element
    #[error("document root is not an Atom feed element")]
    NotAtomFeed,

    /// An entry has zero or several category elements
    #[error("entry {id} doesn't have exactly one category (found {count})")]
    CategoryCardinality {
        /// The offending entry ID (empty if the entry has no ID)
        id: String,
        /// How many category elements were found
        count: usize,
    },

    /// An entry has zero or several link elements
    #[error("entry {id} does not have exactly one link (found {count})")]
    LinkCardinality {
        /// The offending entry ID (empty if the entry has no ID)
        id: String,
        /// How many link elements were found
        count: usize,
    },

    /// A required element or attribute is absent
    #[error("entry {id} is missing required {field}")]
    MissingField {
        /// The offending entry ID (empty if the entry has no ID)
        id: String,
        /// Name of the missing element or attribute
        field: &'static str,
    },

    /// The link length attribute is not a byte count
    #[error("entry {id} has invalid link length '{value}'")]
    InvalidLength {
        /// The offending entry ID
        id: String,
        /// The raw attribute value
        value: String,
    },

    /// Two entries share the same ID
    #[error("feed contains duplicate entries for ID {id}")]
    DuplicateEntry {
        /// The duplicated entry ID
        id: String,
    },
}

/// Errors raised while ordering two entries by version
#[derive(Debug, Error)]
pub enum VersionError {
    /// The entries are versions of different content items
    #[error(
        "cannot compare entries with mismatching content item identifiers {left} and {right}"
    )]
    MismatchingContentIdentifier {
        /// Content item identifier of the left entry
        left: String,
        /// Content item identifier of the right entry
        right: String,
    },

    /// The version strings use incompatible formats
    #[error("mismatching version formats '{left}' and '{right}': {reason}")]
    MismatchingVersionFormat {
        /// Version string of the left entry
        left: String,
        /// Version string of the right entry
        right: String,
        /// Which rule rejected the pair
        reason: String,
    },

    /// Neither side is a supported version format
    #[error(
        "latest entry cannot be determined, versions '{left}' and '{right}' are not integers, versioned URIs or semantic versions"
    )]
    UnsupportedVersionFormat {
        /// Version string of the left entry
        left: String,
        /// Version string of the right entry
        right: String,
    },
}

/// Download-related errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Downloaded bytes do not match the hash and length published in the feed
    #[error(
        "downloaded file {path} has sha256 {observed_hash} and length {observed_length}, feed specifies sha256 {expected_hash} and length {expected_length}"
    )]
    HashValidationFailure {
        /// Where the file was written (it has been removed)
        path: PathBuf,
        /// SHA-256 of the bytes received
        observed_hash: String,
        /// Number of bytes received
        observed_length: u64,
        /// SHA-256 advertised by the feed
        expected_hash: String,
        /// Length advertised by the feed
        expected_length: u64,
    },

    /// The artefact endpoint answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The artefact URL
        url: String,
        /// The HTTP status code
        status: u16,
    },

    /// No file name can be derived from the entry's source URL
    #[error("cannot derive a file name from source URL '{url}'")]
    InvalidSourceUrl {
        /// The offending URL
        url: String,
    },
}
