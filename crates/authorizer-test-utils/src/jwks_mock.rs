//! Mock JWKS endpoint
//!
//! Wraps a `wiremock::MockServer` serving `/.well-known/jwks.json` so tests
//! can control exactly what the issuer publishes, and how it fails.

use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock issuer publishes its key set under.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Mock identity provider key-set endpoint.
///
/// # Example
/// ```rust,ignore
/// let mock = JwksMock::start().await;
/// mock.serve_keys(vec![TestKeypair::primary(TEST_KID).jwk_json()]).await;
/// let fetcher = HttpKeySetFetcher::new(mock.jwks_url(), Duration::from_secs(2))?;
/// ```
pub struct JwksMock {
    server: MockServer,
}

impl JwksMock {
    /// Start a mock server on a random local port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Full URL of the key-set endpoint.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Serve `{ "keys": keys }` with status 200.
    pub async fn serve_keys(&self, keys: Vec<Value>) {
        self.serve_json(serde_json::json!({ "keys": keys })).await;
    }

    /// Serve an arbitrary JSON body with status 200.
    pub async fn serve_json(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve a raw, possibly invalid, body with status 200.
    pub async fn serve_raw(&self, body: &str) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Respond with `status` to every request.
    pub async fn serve_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Respond with `status` to the next request only. Mount this before
    /// `serve_keys` to simulate a transient failure followed by recovery.
    pub async fn serve_status_once(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
    }

    /// Serve the key set only after `delay`, to exercise fetch timeouts.
    pub async fn serve_keys_after(&self, keys: Vec<Value>, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "keys": keys }))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Drop every mounted response and the request log.
    pub async fn reset(&self) {
        self.server.reset().await;
    }

    /// Number of requests the endpoint has received so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
