//! Configuration types for syndication-client

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Default NCTS syndication feed
pub const DEFAULT_FEED_URL: &str =
    "https://api.healthterminologies.gov.au/syndication/v1/syndication.xml";

/// Default NCTS OAuth2 token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://api.healthterminologies.gov.au/oauth2/token";

/// Client credentials used for the OAuth2 `client_credentials` grant
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Client ID issued by the token endpoint's operator
    pub client_id: String,

    /// Secret for `client_id`
    pub client_secret: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

// Keep the secret out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// HTTP transport settings shared by feed, token and artefact requests
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout (default: 300 seconds; artefacts can be large)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Build a reqwest client from these settings
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {}", e),
                key: Some("http".to_string()),
            })
    }
}

/// Main configuration for [`SyncEngine`](crate::SyncEngine)
///
/// Every field has a default, so `Config::default()` targets the public NCTS
/// endpoints, downloads into the current directory and runs without
/// authentication.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// URL of the syndication feed (`file://` URLs are read from disk)
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// URL of the OAuth2 token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Directory artefacts are written to (default: ".")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Client credentials (None = artefacts are fetched without authentication)
    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Maximum number of artefacts downloaded at once (default: 1)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            token_url: default_token_url(),
            output_dir: default_output_dir(),
            credentials: None,
            http: HttpConfig::default(),
            max_concurrent_downloads: default_max_concurrent(),
        }
    }
}

impl Config {
    /// Configuration targeting the default endpoints with the given output directory
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Check the configuration for values that can never work
    pub fn validate(&self) -> Result<()> {
        check_url(&self.feed_url, "feed_url")?;
        check_url(&self.token_url, "token_url")?;

        if self.max_concurrent_downloads == 0 {
            return Err(Error::Config {
                message: "max_concurrent_downloads must be at least 1".to_string(),
                key: Some("max_concurrent_downloads".to_string()),
            });
        }

        if let Some(credentials) = &self.credentials
            && (credentials.client_id.is_empty() || credentials.client_secret.is_empty())
        {
            return Err(Error::Config {
                message: "client_id and client_secret must both be non-empty".to_string(),
                key: Some("credentials".to_string()),
            });
        }

        Ok(())
    }
}

fn check_url(value: &str, key: &str) -> Result<()> {
    url::Url::parse(value).map(|_| ()).map_err(|e| Error::Config {
        message: format!("invalid URL '{}': {}", value, e),
        key: Some(key.to_string()),
    })
}

// Default value functions
fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_concurrent() -> usize {
    1
}

fn default_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_user_agent() -> String {
    format!("syndication-client/{}", env!("CARGO_PKG_VERSION"))
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
