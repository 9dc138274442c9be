//! Mock syndication service: feed, token endpoint and artefact files

use super::fixtures::{Artefact, TEST_TOKEN, feed_xml, standard_artefacts};
use syndication_client::{Config, Credentials, SyncEngine};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client ID the mock token endpoint accepts
pub const TEST_CLIENT_ID: &str = "test-client";
/// Client secret the mock token endpoint accepts
pub const TEST_CLIENT_SECRET: &str = "test-secret";

/// A running mock service plus a scratch output directory
pub struct TestSyndication {
    /// The wiremock server
    pub server: MockServer,
    /// Output directory for downloads
    pub output_dir: TempDir,
    /// What the feed advertises
    pub artefacts: Vec<Artefact>,
}

impl TestSyndication {
    /// Serve the standard feed with a working token endpoint
    pub async fn start() -> Self {
        Self::start_with(standard_artefacts()).await
    }

    /// Serve a feed of `artefacts` with a working token endpoint
    pub async fn start_with(artefacts: Vec<Artefact>) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/syndication.xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/atom+xml")
                    .set_body_string(feed_xml(&server.uri(), &artefacts)),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains(format!("client_id={}", TEST_CLIENT_ID)))
            .and(body_string_contains(format!("client_secret={}", TEST_CLIENT_SECRET)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{ "access_token":"{}"}}"#, TEST_TOKEN)),
            )
            .mount(&server)
            .await;

        for artefact in &artefacts {
            Mock::given(method("GET"))
                .and(path(format!("/{}", artefact.file)))
                .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(artefact.served))
                .mount(&server)
                .await;
        }

        Self {
            server,
            output_dir: TempDir::new().expect("failed to create output dir"),
            artefacts,
        }
    }

    /// Engine configuration pointing at the mock service
    pub fn config(&self) -> Config {
        Config {
            feed_url: format!("{}/syndication.xml", self.server.uri()),
            token_url: format!("{}/oauth2/token", self.server.uri()),
            output_dir: self.output_dir.path().to_path_buf(),
            credentials: Some(Credentials::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET)),
            ..Default::default()
        }
    }

    /// Engine built from [`config`](Self::config)
    pub fn engine(&self) -> SyncEngine {
        SyncEngine::new(self.config()).expect("test config should be valid")
    }

    /// The artefact published as `file`
    pub fn artefact(&self, file: &str) -> &Artefact {
        self.artefacts
            .iter()
            .find(|artefact| artefact.file == file)
            .unwrap_or_else(|| panic!("no artefact named {}", file))
    }

    /// Number of requests the server received for `path`
    pub async fn requests_to(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == request_path)
            .count()
    }
}
