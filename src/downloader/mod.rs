//! Artefact downloader with local caching and SHA-256 validation
//!
//! [`Downloader::ensure`] makes sure a verified copy of an entry's artefact
//! sits in an output directory. A file that is already present is hashed and
//! reused when it matches the feed; anything else is (re)fetched, streamed to
//! disk while being hashed, and removed again if it does not match.
//!
//! Artefact requests carry a bearer token obtained from the OAuth2 token
//! endpoint (see [`Downloader::bearer_token`]). The token is fetched at most
//! once per `Downloader` value.

mod auth;

use crate::config::{Config, Credentials};
use crate::error::{DownloadError, Result};
use crate::types::{DownloadResult, Entry};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

/// Read buffer used when hashing files already on disk
const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Fetches feed artefacts into a local directory
///
/// A `Downloader` is cheap to share by reference across concurrent tasks:
/// token acquisition is single-flight and each target path is guarded by its
/// own async lock.
pub struct Downloader {
    client: reqwest::Client,
    token_url: String,
    credentials: Option<Credentials>,
    token: OnceCell<String>,
    path_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Downloader {
    /// Create a downloader
    ///
    /// With `credentials` set to `None` artefacts are requested without an
    /// `Authorization` header and `token_url` is never contacted.
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            credentials,
            token: OnceCell::new(),
            path_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a downloader from the token endpoint, credentials and HTTP
    /// settings of `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.http.build_client()?,
            config.token_url.clone(),
            config.credentials.clone(),
        ))
    }

    /// Ensure a valid local copy of `entry` exists in `output_dir`
    ///
    /// The target is `output_dir` joined with the last path segment of the
    /// entry's source URL; `entry.local_file` is set to it before anything
    /// else happens. The directory is created if needed.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidSourceUrl`] if no file name can be derived
    /// - [`DownloadError::HttpStatus`] if the artefact endpoint refuses the request
    /// - [`DownloadError::HashValidationFailure`] if the fetched bytes don't
    ///   match the feed (the file is removed)
    /// - [`Error::Authentication`](crate::Error::Authentication) if no token
    ///   could be obtained
    /// - [`Error::Io`](crate::Error::Io) if the directory or file cannot be
    ///   written, or a stale copy cannot be removed
    pub async fn ensure(&self, entry: &mut Entry, output_dir: &Path) -> Result<DownloadResult> {
        let file_name = entry
            .file_name()
            .ok_or_else(|| DownloadError::InvalidSourceUrl {
                url: entry.source_url.clone(),
            })?;

        tokio::fs::create_dir_all(output_dir).await?;
        let path = output_dir.join(file_name);
        entry.local_file = Some(path.clone());

        let lock = self.path_lock(&path).await;
        let result = {
            let _guard = lock.lock().await;
            self.ensure_locked(entry, path.clone()).await
        };
        self.release_path_lock(&path, lock).await;
        result
    }

    /// Cache check, fetch and validation of `path`; the caller holds its lock
    async fn ensure_locked(&self, entry: &Entry, path: PathBuf) -> Result<DownloadResult> {
        if is_regular_file(&path).await? {
            let (hash, length) = hash_file(&path).await?;
            if matches_entry(entry, &hash, length) {
                info!(
                    entry_id = %entry.id,
                    path = %path.display(),
                    "Local copy matches feed, skipping download"
                );
                return Ok(DownloadResult {
                    entry_id: entry.id.clone(),
                    path,
                    freshly_downloaded: false,
                });
            }

            warn!(
                entry_id = %entry.id,
                path = %path.display(),
                observed_hash = %hash,
                observed_length = length,
                expected_hash = %entry.content_hash,
                expected_length = entry.content_length,
                "Local copy does not match feed, downloading again"
            );
            tokio::fs::remove_file(&path).await?;
        }

        info!(
            entry_id = %entry.id,
            url = %entry.source_url,
            path = %path.display(),
            "Downloading artefact"
        );
        let (hash, length) = self.fetch_to(entry, &path).await?;

        if !matches_entry(entry, &hash, length) {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove artefact that failed validation"
                );
            }
            return Err(DownloadError::HashValidationFailure {
                path,
                observed_hash: hash,
                observed_length: length,
                expected_hash: entry.content_hash.clone(),
                expected_length: entry.content_length,
            }
            .into());
        }

        info!(
            entry_id = %entry.id,
            path = %path.display(),
            bytes = length,
            "Download complete"
        );
        Ok(DownloadResult {
            entry_id: entry.id.clone(),
            path,
            freshly_downloaded: true,
        })
    }

    /// Lock guarding every check/fetch/validate sequence on `path`
    async fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.path_locks.lock().await;
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Drop the lock entry for `path` once no other task holds or awaits it
    async fn release_path_lock(&self, path: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = self.path_locks.lock().await;
        drop(lock);
        if locks
            .get(path)
            .is_some_and(|held| Arc::strong_count(held) == 1)
        {
            locks.remove(path);
        }
    }

    /// Number of target paths with a live lock entry
    #[cfg(test)]
    async fn tracked_paths(&self) -> usize {
        self.path_locks.lock().await.len()
    }

    /// Stream the artefact into `path`, returning its hex SHA-256 and length
    ///
    /// A partially written file is removed before an error is returned.
    async fn fetch_to(&self, entry: &Entry, path: &Path) -> Result<(String, u64)> {
        let mut request = self.client.get(&entry.source_url);
        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let mut response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                url: entry.source_url.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let mut file = File::create(path).await?;
        let written = write_body(&mut response, &mut file).await;
        drop(file);

        if written.is_err()
            && let Err(e) = tokio::fs::remove_file(path).await
        {
            warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove partially downloaded artefact"
            );
        }
        written
    }
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("token_url", &self.token_url)
            .field("credentials", &self.credentials)
            .field("token_cached", &self.token.initialized())
            .finish_non_exhaustive()
    }
}

async fn write_body(response: &mut reqwest::Response, file: &mut File) -> Result<(String, u64)> {
    let mut hasher = Sha256::new();
    let mut length = 0u64;

    while let Some(chunk) = response.chunk().await? {
        hasher.update(&chunk);
        file.write_all(&chunk).await?;
        length += chunk.len() as u64;
    }
    file.flush().await?;

    debug!(bytes = length, "Response body written");
    Ok((format!("{:x}", hasher.finalize()), length))
}

async fn is_regular_file(path: &Path) -> Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Hex SHA-256 and byte length of a file on disk
async fn hash_file(path: &Path) -> Result<(String, u64)> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    let mut length = 0u64;

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        length += read as u64;
    }

    Ok((format!("{:x}", hasher.finalize()), length))
}

fn matches_entry(entry: &Entry, hash: &str, length: u64) -> bool {
    length == entry.content_length && hash.eq_ignore_ascii_case(entry.content_hash.trim())
}
