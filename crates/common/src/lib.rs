//! Utilities shared by the authorizer crates.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (size limits, unverified parsing, iat validation)
pub mod jwt;

/// Module for secret types that prevent accidental logging
pub mod secret;
