//! Gateway authorization handler.

use crate::auth::decision::{AccessDecision, WILDCARD_RESOURCE};
use crate::models::AuthorizeRequest;
use crate::routes::AppState;
use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /v1/authorize
///
/// Always answers 200 with a policy decision; failures are denies, never
/// HTTP errors. An unparseable body is treated as a request without a
/// token.
///
/// ## Request
///
/// ```json
/// {
///   "type": "TOKEN",
///   "authorizationToken": "Bearer eyJ...",
///   "methodArn": "arn:aws:execute-api:us-east-1:123456789012:abc/dev/GET/todos"
/// }
/// ```
#[instrument(skip_all, name = "authz.handlers.authorize")]
pub async fn authorize(State(state): State<Arc<AppState>>, body: Bytes) -> Json<AccessDecision> {
    let request: AuthorizeRequest = serde_json::from_slice(&body).unwrap_or_else(|e| {
        tracing::debug!(target: "authz.handlers.authorize", error = %e, "Unparseable authorize request");
        AuthorizeRequest::default()
    });

    let resource = request
        .method_arn
        .as_deref()
        .filter(|arn| !arn.is_empty())
        .unwrap_or(WILDCARD_RESOURCE);

    let decision = state
        .authorizer
        .authorize_resource(request.authorization_token.as_deref(), resource)
        .await;

    Json(decision)
}
