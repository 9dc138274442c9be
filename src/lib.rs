//! # syndication-client
//!
//! Client library for NCTS-style Atom syndication feeds that publish
//! versioned, hash-verified artefacts (terminology releases and similar).
//!
//! ## Design Philosophy
//!
//! syndication-client is designed to be:
//! - **Library-first** - No CLI, purely a Rust crate for embedding
//! - **Sensible defaults** - Targets the public NCTS endpoints out of the box
//! - **Strict** - A feed that breaks its own rules, a version pair that cannot
//!   be ordered or a file that fails its hash is an error, never a guess
//! - **Idempotent** - A valid local copy is reused instead of downloaded again
//!
//! ## Quick Start
//!
//! ```no_run
//! use syndication_client::{Config, Credentials, SyncEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         output_dir: "./releases".into(),
//!         credentials: Some(Credentials::new("client-id", "client-secret")),
//!         ..Default::default()
//!     };
//!
//!     let engine = SyncEngine::new(config)?;
//!
//!     // Latest release of a single category
//!     let release = engine.sync_latest_single("SCT_RF2_SNAPSHOT").await?;
//!     println!("{} (fresh: {})", release.path().display(), release.freshly_downloaded);
//!
//!     // Every published version of two categories
//!     let all = engine.sync(["SCT_RF2_FULL", "AMT_CSV"], false).await?;
//!     for (category, files) in &all {
//!         println!("{}: {} files", category, files.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Artefact downloads with hash validation and token handling
pub mod downloader;
/// High-level category synchronization
pub mod engine;
/// Error types
pub mod error;
/// Feed parsing and entry resolution
pub mod feed;
/// Core types
pub mod types;
/// Version ordering of feed entries
pub mod version;

pub use config::{Config, Credentials, HttpConfig};
pub use downloader::Downloader;
pub use engine::SyncEngine;
pub use error::{DownloadError, Error, FeedError, Result, VersionError};
pub use feed::{CategoryIndex, Feed, MatchingEntries};
pub use types::{DownloadResult, Entry};
pub use version::{ParsedVersion, compare_entries, compare_versions};
