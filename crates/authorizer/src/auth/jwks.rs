//! JWKS fetching and caching.
//!
//! The issuer publishes its signing keys as a JSON Web Key Set. Fetching is
//! behind the [`KeySetFetcher`] capability so the HTTP transport can be
//! swapped in tests; [`KeySetCache`] sits in front of any fetcher and holds
//! the last good key set for a configured TTL.
//!
//! # Security
//!
//! - Keys are cached to reduce load on the issuer and improve latency
//! - Expired entries are never served; a failed refresh denies instead
//! - An unknown `kid` may force one reload, at most once per
//!   [`RELOAD_COOLDOWN`]
//! - HTTPS is required unless explicitly relaxed in configuration

use crate::clock::Clock;
use crate::errors::AuthError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Pause before the single retry of a transient fetch failure.
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Minimum age of a cached key set before an unknown `kid` may force a
/// reload.
pub const RELOAD_COOLDOWN: Duration = Duration::from_secs(30);

/// A JSON Web Key as published by the issuer.
///
/// Every member is optional here; [`crate::auth::keys`] decides which
/// entries are usable signing keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key ID - used to select the correct key for verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Key type ("RSA" for the keys we accept).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kty: Option<String>,

    /// Key use ("sig" for signing keys).
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// Certificate chain, leaf first, each entry standard base64 DER.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,

    /// RSA modulus (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// Algorithm hint. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

/// JWKS document. A missing `keys` member is an empty set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    #[serde(default)]
    pub keys: Vec<Jwk>,
}

/// Capability to retrieve the issuer's current key set.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// Where the keys come from, for logs.
    fn source(&self) -> &str;

    /// Fetch and parse the key set.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeySetUnavailable` if the keys cannot be
    /// retrieved or parsed.
    async fn fetch(&self) -> Result<Vec<Jwk>, AuthError>;
}

enum FetchError {
    /// Worth one more attempt: connect failure, timeout, 5xx.
    Transient,
    /// Anything else: 4xx, unparseable body.
    Permanent,
}

/// Fetches the key set over HTTP(S).
pub struct HttpKeySetFetcher {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,
}

impl HttpKeySetFetcher {
    /// Create a fetcher whose requests are bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the HTTP client cannot be built.
    pub fn new(jwks_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            http_client,
        })
    }

    async fn fetch_once(&self) -> Result<Vec<Jwk>, FetchError> {
        let response = self.http_client.get(&self.jwks_url).send().await.map_err(|e| {
            tracing::error!(target: "authz.jwks", error = %e, "Failed to fetch JWKS");
            FetchError::Transient
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(target: "authz.jwks", status = %status, "JWKS endpoint returned error");
            return Err(if status.is_server_error() {
                FetchError::Transient
            } else {
                FetchError::Permanent
            });
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!(target: "authz.jwks", error = %e, "Failed to read JWKS response");
            FetchError::Transient
        })?;

        let jwks: JwksResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(target: "authz.jwks", error = %e, "Failed to parse JWKS response");
            FetchError::Permanent
        })?;

        Ok(jwks.keys)
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    fn source(&self) -> &str {
        &self.jwks_url
    }

    #[instrument(skip(self), fields(url = %self.jwks_url))]
    async fn fetch(&self) -> Result<Vec<Jwk>, AuthError> {
        tracing::debug!(target: "authz.jwks", "Fetching JWKS");

        match self.fetch_once().await {
            Ok(keys) => Ok(keys),
            Err(FetchError::Permanent) => Err(AuthError::KeySetUnavailable),
            Err(FetchError::Transient) => {
                tracing::warn!(target: "authz.jwks", "Retrying JWKS fetch once");
                tokio::time::sleep(RETRY_DELAY).await;
                self.fetch_once()
                    .await
                    .map_err(|_| AuthError::KeySetUnavailable)
            }
        }
    }
}

/// Serves a fixed key set. Counts how often it was asked.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct StaticKeySetFetcher {
    keys: Vec<Jwk>,
    fetch_count: AtomicUsize,
}

#[cfg(test)]
impl StaticKeySetFetcher {
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self {
            keys,
            fetch_count: AtomicUsize::new(0),
        }
    }

    /// Number of completed fetches.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl KeySetFetcher for StaticKeySetFetcher {
    fn source(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<Jwk>, AuthError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        // Yield so concurrent callers actually overlap in tests.
        tokio::task::yield_now().await;
        Ok(self.keys.clone())
    }
}

/// Cached key set with expiry time.
struct CachedKeySet {
    keys: Arc<[Jwk]>,
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// TTL cache in front of a [`KeySetFetcher`].
///
/// At most one refresh is in flight at a time; callers that miss while a
/// refresh is running wait for it and then reuse its result.
pub struct KeySetCache {
    fetcher: Arc<dyn KeySetFetcher>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    reload_cooldown: chrono::Duration,
    cache: RwLock<Option<CachedKeySet>>,
    refresh_guard: Mutex<()>,
}

impl KeySetCache {
    /// Create an empty cache. Nothing is fetched until the first lookup.
    pub fn new(fetcher: Arc<dyn KeySetFetcher>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());
        let reload_cooldown =
            chrono::Duration::from_std(RELOAD_COOLDOWN).unwrap_or_else(|_| chrono::Duration::zero());

        Self {
            fetcher,
            clock,
            ttl,
            reload_cooldown,
            cache: RwLock::new(None),
            refresh_guard: Mutex::new(()),
        }
    }

    /// Current key set, fetching it if the cache is empty or expired.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeySetUnavailable` if a refresh was needed and
    /// failed. A failed refresh leaves the cache empty.
    pub async fn keys(&self) -> Result<Arc<[Jwk]>, AuthError> {
        if let Some(keys) = self.fresh().await {
            tracing::debug!(target: "authz.jwks", "JWKS cache hit");
            return Ok(keys);
        }

        let _guard = self.refresh_guard.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(keys) = self.fresh().await {
            return Ok(keys);
        }

        self.refresh().await
    }

    /// Refetch after `seen` turned out not to hold a wanted key.
    ///
    /// Returns the cached set without fetching when another caller has
    /// already replaced `seen`, or when the cached set is younger than
    /// [`RELOAD_COOLDOWN`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeySetUnavailable` if the reload fails. A failed
    /// reload leaves the cache empty.
    pub async fn reload(&self, seen: &Arc<[Jwk]>) -> Result<Arc<[Jwk]>, AuthError> {
        let _guard = self.refresh_guard.lock().await;

        {
            let cache = self.cache.read().await;
            let now = self.clock.now();
            if let Some(cached) = cache.as_ref().filter(|cached| cached.expires_at > now) {
                if !Arc::ptr_eq(&cached.keys, seen) {
                    return Ok(Arc::clone(&cached.keys));
                }
                if now < cached.fetched_at + self.reload_cooldown {
                    tracing::debug!(target: "authz.jwks", "JWKS reload skipped, key set is recent");
                    return Ok(Arc::clone(&cached.keys));
                }
            }
        }

        self.refresh().await
    }

    async fn fresh(&self) -> Option<Arc<[Jwk]>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|cached| cached.expires_at > self.clock.now())
            .map(|cached| Arc::clone(&cached.keys))
    }

    async fn refresh(&self) -> Result<Arc<[Jwk]>, AuthError> {
        let result = self.fetcher.fetch().await;

        let mut cache = self.cache.write().await;
        match result {
            Ok(keys) => {
                let keys: Arc<[Jwk]> = keys.into();
                tracing::info!(
                    target: "authz.jwks",
                    source = %self.fetcher.source(),
                    key_count = keys.len(),
                    "JWKS cache refreshed"
                );
                let now = self.clock.now();
                *cache = Some(CachedKeySet {
                    keys: Arc::clone(&keys),
                    fetched_at: now,
                    expires_at: now + self.ttl,
                });
                Ok(keys)
            }
            Err(err) => {
                *cache = None;
                Err(err)
            }
        }
    }
}
