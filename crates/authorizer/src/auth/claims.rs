//! Verified JWT claims.
//!
//! Registered claims the authorizer relies on are named fields; everything
//! else the issuer adds (scopes, permissions, namespaced profile claims) is
//! kept in `extra`. The `sub` field is redacted in Debug output to prevent
//! exposure in logs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The `aud` claim, which RFC 7519 allows to be a string or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience string.
    Single(String),

    /// An array of audiences.
    Multiple(Vec<String>),
}

impl Default for Audience {
    fn default() -> Self {
        Audience::Multiple(Vec::new())
    }
}

impl Audience {
    /// Whether `audience` is one of the token's audiences.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }

    /// All audiences as a list.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Audience::Single(aud) => vec![aud.as_str()],
            Audience::Multiple(auds) => auds.iter().map(String::as_str).collect(),
        }
    }
}

/// JWT Claims structure for verified tokens.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID at the identity provider) - redacted in Debug output.
    pub sub: String,

    /// Issuer URL.
    pub iss: String,

    /// Intended audience(s). Absent in the token means empty.
    #[serde(default)]
    pub aud: Audience,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Not-before timestamp (Unix epoch seconds), if the issuer sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Custom claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Claims {
    /// A custom claim by name.
    pub fn custom(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Scopes from the space-separated `scope` claim, if present.
    pub fn scopes(&self) -> Vec<&str> {
        self.custom("scope")
            .and_then(Value::as_str)
            .map(|scope| scope.split_whitespace().collect())
            .unwrap_or_default()
    }
}
