//! Key-set fetcher and cache tests against a mocked JWKS endpoint.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use authorizer::auth::{
    Authorizer, ClaimPolicy, HttpKeySetFetcher, JwtValidator, KeySetCache, KeySetFetcher,
};
use authorizer::clock::Clock;
use authorizer::errors::AuthError;
use authorizer_test_utils::*;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wall-clock start plus a manually advanced offset.
struct OffsetClock {
    start: DateTime<Utc>,
    offset_secs: AtomicI64,
}

impl OffsetClock {
    fn advance(&self, seconds: i64) {
        self.offset_secs.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for OffsetClock {
    fn now(&self) -> DateTime<Utc> {
        self.start + chrono::Duration::seconds(self.offset_secs.load(Ordering::SeqCst))
    }
}

fn fetcher(mock: &JwksMock) -> HttpKeySetFetcher {
    HttpKeySetFetcher::new(mock.jwks_url(), Duration::from_secs(1)).unwrap()
}

fn offset_clock() -> Arc<OffsetClock> {
    Arc::new(OffsetClock {
        start: Utc::now(),
        offset_secs: AtomicI64::new(0),
    })
}

#[tokio::test]
async fn test_fetch_parses_keys_in_order() {
    let mock = JwksMock::start().await;
    mock.serve_keys(vec![
        TestKeypair::primary("first").jwk_json(),
        TestKeypair::rogue("second").jwk_components_json(),
    ])
    .await;

    let keys = fetcher(&mock).fetch().await.unwrap();

    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].kid.as_deref(), Some("first"));
    assert_eq!(keys[0].x5c.as_ref().unwrap()[0], PRIMARY_CERT_X5C);
    assert_eq!(keys[1].kid.as_deref(), Some("second"));
    assert!(keys[1].x5c.is_none());
}

#[tokio::test]
async fn test_missing_keys_member_is_empty_set() {
    let mock = JwksMock::start().await;
    mock.serve_json(json!({})).await;

    assert!(fetcher(&mock).fetch().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_not_found_is_unavailable_without_retry() {
    let mock = JwksMock::start().await;
    mock.serve_status(404).await;

    assert_eq!(
        fetcher(&mock).fetch().await.unwrap_err(),
        AuthError::KeySetUnavailable
    );
    assert_eq!(mock.request_count().await, 1);
}

#[tokio::test]
async fn test_invalid_body_is_unavailable_without_retry() {
    let mock = JwksMock::start().await;
    mock.serve_raw("<html>not json</html>").await;

    assert_eq!(
        fetcher(&mock).fetch().await.unwrap_err(),
        AuthError::KeySetUnavailable
    );
    assert_eq!(mock.request_count().await, 1);
}

#[tokio::test]
async fn test_server_error_is_retried_once() {
    let mock = JwksMock::start().await;
    mock.serve_status_once(503).await;
    mock.serve_keys(vec![TestKeypair::primary(TEST_KID).jwk_json()])
        .await;

    let keys = fetcher(&mock).fetch().await.unwrap();

    assert_eq!(keys.len(), 1);
    assert_eq!(mock.request_count().await, 2);
}

#[tokio::test]
async fn test_persistent_server_error_gives_up_after_retry() {
    let mock = JwksMock::start().await;
    mock.serve_status(503).await;

    assert_eq!(
        fetcher(&mock).fetch().await.unwrap_err(),
        AuthError::KeySetUnavailable
    );
    assert_eq!(mock.request_count().await, 2);
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let mock = JwksMock::start().await;
    mock.serve_keys_after(
        vec![TestKeypair::primary(TEST_KID).jwk_json()],
        Duration::from_secs(3),
    )
    .await;

    let result = fetcher(&mock).fetch().await;

    assert_eq!(result.unwrap_err(), AuthError::KeySetUnavailable);
}

#[tokio::test]
async fn test_cache_serves_from_memory_until_ttl() {
    let mock = JwksMock::start().await;
    mock.serve_keys(vec![TestKeypair::primary(TEST_KID).jwk_json()])
        .await;
    let clock = offset_clock();
    let cache = KeySetCache::new(
        Arc::new(fetcher(&mock)),
        clock.clone(),
        Duration::from_secs(600),
    );

    cache.keys().await.unwrap();
    cache.keys().await.unwrap();
    assert_eq!(mock.request_count().await, 1);

    clock.advance(600);
    cache.keys().await.unwrap();
    assert_eq!(mock.request_count().await, 2);
}

#[tokio::test]
async fn test_cache_does_not_serve_stale_keys_after_failed_refresh() {
    let mock = JwksMock::start().await;
    mock.serve_keys(vec![TestKeypair::primary(TEST_KID).jwk_json()])
        .await;
    let clock = offset_clock();
    let cache = KeySetCache::new(
        Arc::new(fetcher(&mock)),
        clock.clone(),
        Duration::from_secs(60),
    );
    assert_eq!(cache.keys().await.unwrap().len(), 1);

    // Issuer goes away after the first fetch
    mock.reset().await;
    mock.serve_status(404).await;
    clock.advance(61);

    assert_eq!(cache.keys().await.unwrap_err(), AuthError::KeySetUnavailable);
}

#[tokio::test]
async fn test_concurrent_misses_share_one_fetch() {
    let mock = JwksMock::start().await;
    mock.serve_keys_after(
        vec![TestKeypair::primary(TEST_KID).jwk_json()],
        Duration::from_millis(200),
    )
    .await;
    let cache = Arc::new(KeySetCache::new(
        Arc::new(fetcher(&mock)),
        offset_clock(),
        Duration::from_secs(600),
    ));

    let lookups = (0..10).map(|_| {
        let cache = Arc::clone(&cache);
        async move { cache.keys().await }
    });
    let results = futures::future::join_all(lookups).await;

    assert!(results.iter().all(|r| r.as_ref().map(|k| k.len()) == Ok(1)));
    assert_eq!(mock.request_count().await, 1);
}

#[tokio::test]
async fn test_rotated_key_is_picked_up_within_ttl() {
    let mock = JwksMock::start().await;
    mock.serve_keys(vec![TestKeypair::rogue("retiring").jwk_json()])
        .await;
    let clock = offset_clock();
    let cache = Arc::new(KeySetCache::new(
        Arc::new(fetcher(&mock)),
        clock.clone(),
        Duration::from_secs(600),
    ));
    let authorizer = Authorizer::new(cache, JwtValidator::new(ClaimPolicy::default(), clock.clone()));
    let header = format!(
        "Bearer {}",
        TestKeypair::primary(TEST_KID).sign(&TestTokenBuilder::new().for_user("auth0|rotated").build())
    );

    assert_eq!(
        authorizer.check(Some(&header)).await.unwrap_err(),
        AuthError::KeyNotFound
    );
    assert_eq!(mock.request_count().await, 1);

    // Issuer rotates well inside the cache TTL
    mock.reset().await;
    mock.serve_keys(vec![
        TestKeypair::rogue("retiring").jwk_json(),
        TestKeypair::primary(TEST_KID).jwk_json(),
    ])
    .await;
    clock.advance(60);

    let claims = authorizer.check(Some(&header)).await.unwrap();
    assert_eq!(claims.sub, "auth0|rotated");
    assert_eq!(mock.request_count().await, 1);

    authorizer.check(Some(&header)).await.unwrap();
    assert_eq!(mock.request_count().await, 1, "reloaded set should be cached");
}
