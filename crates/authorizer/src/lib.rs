//! Bearer-Token Authorizer Library
//!
//! Verifies RS256-signed bearer tokens against an identity provider's
//! published key set and turns the outcome into an allow/deny decision for
//! a request gateway.
//!
//! # Architecture
//!
//! ```text
//! header -> token parse (kid) -> key set (cached) -> key select -> verify -> decision
//! ```
//!
//! # Modules
//!
//! - `auth` - The authorization pipeline
//! - `clock` - Injectable time source
//! - `config` - Service configuration from environment
//! - `errors` - Failure kinds and the uniform 401 response
//! - `handlers` - HTTP request handlers
//! - `middleware` - Admission gate for protected routes
//! - `models` - Request and response bodies
//! - `routes` - Axum router setup

pub mod auth;
pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
