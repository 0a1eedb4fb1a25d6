//! Current user handler.
//!
//! Returns information about the authenticated caller from verified claims.

use crate::auth::Claims;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Response for `/v1/me` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// Subject (user ID at the identity provider).
    pub sub: String,

    /// Token issuer.
    pub iss: String,

    /// Token audiences.
    pub aud: Vec<String>,

    /// Token scopes.
    pub scopes: Vec<String>,

    /// Token expiration timestamp.
    pub exp: i64,

    /// Token issued-at timestamp.
    pub iat: i64,
}

impl From<Claims> for MeResponse {
    fn from(claims: Claims) -> Self {
        Self {
            scopes: claims.scopes().iter().map(ToString::to_string).collect(),
            aud: claims.aud.values().iter().map(ToString::to_string).collect(),
            sub: claims.sub,
            iss: claims.iss,
            exp: claims.exp,
            iat: claims.iat,
        }
    }
}

/// Handler for GET /v1/me
///
/// Requires valid authentication via the auth middleware.
///
/// ## Response
///
/// ```json
/// {
///   "sub": "auth0|alice",
///   "iss": "https://tenant.example.com/",
///   "aud": ["https://todo-api"],
///   "scopes": ["read:todos"],
///   "exp": 1234567890,
///   "iat": 1234567800
/// }
/// ```
#[instrument(skip_all, name = "authz.handlers.me")]
pub async fn get_me(Extension(claims): Extension<Claims>) -> Json<MeResponse> {
    tracing::debug!(target: "authz.handlers.me", "Returning caller claims");
    Json(MeResponse::from(claims))
}
