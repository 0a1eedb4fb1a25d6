//! Authentication middleware for protected routes.
//!
//! Runs the full bearer check on the `Authorization` header and injects the
//! verified claims into request extensions.

use crate::auth::{Authorizer, Claims};
use crate::errors::AuthError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub authorizer: Arc<Authorizer>,
}

/// Admission gate: reject the request with a uniform 401 unless it carries
/// a valid bearer token.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
#[instrument(skip(state, req, next), name = "authz.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AuthError> {
    let header = match req.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| {
            tracing::debug!(target: "authz.middleware.auth", "Authorization header is not valid UTF-8");
            AuthError::MalformedHeader
        })?),
    };

    let claims = state.authorizer.check(header).await.map_err(|e| {
        tracing::debug!(target: "authz.middleware.auth", kind = e.kind(), "Request rejected");
        e
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extension trait for extracting claims from request.
pub trait ClaimsExt {
    /// Get the authenticated claims from request extensions.
    ///
    /// Returns `None` if auth middleware was not applied to this request.
    fn claims(&self) -> Option<&Claims>;
}

impl<B> ClaimsExt for axum::extract::Request<B> {
    fn claims(&self) -> Option<&Claims> {
        self.extensions().get::<Claims>()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::json;

    #[test]
    fn test_auth_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AuthState>();
    }

    #[test]
    fn test_claims_ext() {
        let mut req = axum::extract::Request::new(Body::empty());
        assert!(req.claims().is_none());

        let claims: Claims = serde_json::from_value(json!({
            "sub": "auth0|alice", "iss": "https://issuer.test/", "exp": 2, "iat": 1
        }))
        .unwrap();
        req.extensions_mut().insert(claims);

        assert_eq!(req.claims().unwrap().sub, "auth0|alice");
    }
}
