//! HTTP routes for the authorizer service.
//!
//! Defines the Axum router and application state.

use crate::auth::Authorizer;
use crate::handlers;
use crate::middleware::{require_auth, AuthState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Per-request timeout. Kept above
/// [`KEY_SET_DEADLINE`](crate::auth::authorizer::KEY_SET_DEADLINE) so
/// `/v1/authorize` answers with a decision rather than a timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<Authorizer>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/v1/health` - Liveness probe - public
/// - `/v1/authorize` - Gateway authorization call - public, always 200
/// - `/v1/me` - Current caller - requires authentication
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>) -> Router {
    let auth_state = Arc::new(AuthState {
        authorizer: Arc::clone(&state.authorizer),
    });

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/v1/health", get(handlers::health_check))
        .route("/v1/authorize", post(handlers::authorize))
        .with_state(state);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/v1/me", get(handlers::get_me))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth));

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    public_routes
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}
