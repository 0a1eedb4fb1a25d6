//! Builder patterns for test claims
//!
//! Provides a fluent API for the claim sets the authorizer verifies.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Issuer used by default in test tokens.
pub const TEST_ISSUER: &str = "https://issuer.test/";

/// Audience used by default in test tokens.
pub const TEST_AUDIENCE: &str = "https://todo-api.test";

/// Subject used by default in test tokens.
pub const TEST_SUBJECT: &str = "auth0|test-user";

/// Builder for creating test JWT claims
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .for_user("auth0|alice")
///     .expires_in(-60)
///     .build();
/// let token = TestKeypair::primary(TEST_KID).sign(&claims);
/// ```
pub struct TestTokenBuilder {
    sub: String,
    iss: String,
    aud: Value,
    exp: i64,
    iat: i64,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new builder: valid for one hour from now, default issuer and
    /// audience.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: TEST_SUBJECT.to_string(),
            iss: TEST_ISSUER.to_string(),
            aud: json!(TEST_AUDIENCE),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            extra: Map::new(),
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the issuer
    pub fn issued_by(mut self, issuer: &str) -> Self {
        self.iss = issuer.to_string();
        self
    }

    /// Set a single audience
    pub fn for_audience(mut self, audience: &str) -> Self {
        self.aud = json!(audience);
        self
    }

    /// Set several audiences (serialized as an array)
    pub fn for_audiences(mut self, audiences: &[&str]) -> Self {
        self.aud = json!(audiences);
        self
    }

    /// Set expiration in seconds from now (negative for an expired token)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set an absolute expiration timestamp
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = timestamp;
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Add a custom claim
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = self.extra;
        claims.insert("sub".to_string(), json!(self.sub));
        claims.insert("iss".to_string(), json!(self.iss));
        claims.insert("aud".to_string(), self.aud);
        claims.insert("exp".to_string(), json!(self.exp));
        claims.insert("iat".to_string(), json!(self.iat));
        Value::Object(claims)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
