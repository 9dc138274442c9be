//! OAuth2 client-credentials token acquisition

use super::Downloader;
use crate::config::Credentials;
use crate::error::{Error, Result};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Downloader {
    /// Bearer token for artefact requests
    ///
    /// The first call POSTs a `client_credentials` grant to the token endpoint;
    /// later calls (including concurrent ones) reuse the cached value. Returns
    /// `None` when the downloader has no credentials.
    ///
    /// # Errors
    ///
    /// [`Error::Authentication`] for any transport failure, non-success status
    /// or unreadable response from the token endpoint. A failed attempt is not
    /// cached; the next call tries again.
    pub async fn bearer_token(&self) -> Result<Option<&str>> {
        let Some(credentials) = &self.credentials else {
            return Ok(None);
        };

        let token = self
            .token
            .get_or_try_init(|| request_token(&self.client, &self.token_url, credentials))
            .await?;
        Ok(Some(token.as_str()))
    }
}

async fn request_token(
    client: &reqwest::Client,
    token_url: &str,
    credentials: &Credentials,
) -> Result<String> {
    info!(token_url, client_id = %credentials.client_id, "Requesting access token");

    let response = client
        .post(token_url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ])
        .send()
        .await
        .map_err(|e| Error::authentication(format!("token request to {} failed: {}", token_url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::authentication(format!(
            "token endpoint {} returned HTTP {}",
            token_url,
            status.as_u16()
        )));
    }

    let body = response.text().await.map_err(|e| {
        Error::authentication(format!("failed to read token response from {}: {}", token_url, e))
    })?;
    let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
        Error::authentication(format!("invalid token response from {}: {}", token_url, e))
    })?;

    if parsed.access_token.is_empty() {
        return Err(Error::authentication(format!(
            "token endpoint {} returned an empty access_token",
            token_url
        )));
    }

    debug!(token_url, "Access token obtained");
    Ok(parsed.access_token)
}
