//! End-to-end authorization check.
//!
//! Header -> unverified token (kid) -> key set -> signing key -> verified
//! claims -> decision. Every step fails with an [`AuthError`]; only
//! [`Authorizer::authorize`] turns failures into a deny.
//!
//! Key-set work is bounded by [`KEY_SET_DEADLINE`], which stays below the
//! HTTP request timeout so a stalled issuer still yields a decision.

use crate::auth::claims::Claims;
use crate::auth::decision::{AccessDecision, WILDCARD_RESOURCE};
use crate::auth::header::extract_bearer;
use crate::auth::jwks::{HttpKeySetFetcher, KeySetCache};
use crate::auth::jwt::{ClaimPolicy, JwtValidator};
use crate::auth::keys::{select_key, ResolvedKey};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::errors::AuthError;
use common::jwt::parse_unverified;
use common::secret::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Upper bound on key-set fetching and key selection for one check.
pub const KEY_SET_DEADLINE: Duration = Duration::from_secs(25);

/// Bearer-token authorizer for one issuer.
pub struct Authorizer {
    key_sets: Arc<KeySetCache>,
    validator: JwtValidator,
    key_set_deadline: Duration,
}

impl Authorizer {
    pub fn new(key_sets: Arc<KeySetCache>, validator: JwtValidator) -> Self {
        Self {
            key_sets,
            validator,
            key_set_deadline: KEY_SET_DEADLINE,
        }
    }

    /// Replace the default [`KEY_SET_DEADLINE`].
    pub fn with_key_set_deadline(mut self, deadline: Duration) -> Self {
        self.key_set_deadline = deadline;
        self
    }

    /// Wire up the HTTP key-set fetcher, cache and validator from `config`
    /// using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let fetcher = Arc::new(HttpKeySetFetcher::new(
            config.jwks_url.clone(),
            config.jwks_fetch_timeout,
        )?);
        let key_sets = Arc::new(KeySetCache::new(
            fetcher,
            Arc::clone(&clock),
            config.jwks_cache_ttl,
        ));
        let policy = ClaimPolicy {
            audience: config.jwt_audience.clone(),
            issuer: config.jwt_issuer.clone(),
            clock_skew: config.jwt_clock_skew,
        };

        Ok(Self::new(key_sets, JwtValidator::new(policy, clock)))
    }

    /// Run the full check on a raw `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's `AuthError`.
    #[instrument(skip_all)]
    pub async fn check(&self, authorization: Option<&str>) -> Result<Claims, AuthError> {
        let credential = extract_bearer(authorization)?;
        let token = credential.expose_secret();

        let unverified = parse_unverified(token).map_err(|e| {
            tracing::debug!(target: "authz.token", error = ?e, "Token parse failed");
            AuthError::from(e)
        })?;
        tracing::debug!(
            target: "authz.token",
            kid = %unverified.header.kid,
            alg = %unverified.header.alg,
            asserted_iss = ?unverified.asserted_issuer(),
            "Token parsed"
        );

        let key = tokio::time::timeout(self.key_set_deadline, self.resolve_key(&unverified.header.kid))
            .await
            .map_err(|_| {
                tracing::warn!(
                    target: "authz.jwks",
                    deadline = ?self.key_set_deadline,
                    "Key set lookup timed out"
                );
                AuthError::KeySetUnavailable
            })??;

        self.validator.verify(token, &key)
    }

    /// Select the key for `kid`, reloading the key set once if the cached
    /// set does not have it.
    async fn resolve_key(&self, kid: &str) -> Result<ResolvedKey, AuthError> {
        let keys = self.key_sets.keys().await?;

        match select_key(&keys, kid) {
            Err(AuthError::KeyNotFound) => {
                tracing::debug!(target: "authz.jwks", kid = %kid, "Unknown kid, reloading key set");
                let reloaded = self.key_sets.reload(&keys).await?;
                select_key(&reloaded, kid)
            }
            result => result,
        }
    }

    /// Authorize with the wildcard resource.
    pub async fn authorize(&self, authorization: Option<&str>) -> AccessDecision {
        self.authorize_resource(authorization, WILDCARD_RESOURCE).await
    }

    /// Authorize, scoping an allow to `resource`.
    pub async fn authorize_resource(
        &self,
        authorization: Option<&str>,
        resource: &str,
    ) -> AccessDecision {
        AccessDecision::from_outcome(self.check(authorization).await, resource)
    }
}
