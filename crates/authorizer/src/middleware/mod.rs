//! HTTP middleware for the authorizer service.
//!
//! # Components
//!
//! - `auth` - Admission gate for protected routes

pub mod auth;

pub use auth::{require_auth, AuthState, ClaimsExt};
