//! # Authorizer Test Utilities
//!
//! Shared test utilities for the authorizer crates.
//!
//! This crate provides:
//! - Fixed RSA keypairs with self-signed certificates (reproducible RS256 tokens)
//! - Test claim builders (`TestTokenBuilder`)
//! - A wiremock-backed JWKS endpoint (`JwksMock`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use authorizer_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let keypair = TestKeypair::primary(TEST_KID);
//!     let mock = JwksMock::start().await;
//!     mock.serve_keys(vec![keypair.jwk_json()]).await;
//!
//!     let token = keypair.sign(&TestTokenBuilder::new().for_user("auth0|alice").build());
//!     // ... point the authorizer at mock.jwks_url() and present `Bearer {token}`
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_mock;
pub mod test_keys;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_mock::*;
pub use test_keys::*;
pub use token_builders::*;
