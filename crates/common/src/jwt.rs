//! JWT utilities shared across the authorizer crates.
//!
//! This module provides:
//! - Size limits for DoS prevention
//! - Clock skew constants for iat validation
//! - Unverified parsing of the JWT header and payload
//! - iat validation logic
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing returned by [`parse_unverified`] may be used for an authorization
//!   decision; it only tells the caller which key to verify with
//! - Generic error messages prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{parse_unverified, validate_iat, DEFAULT_CLOCK_SKEW};
//!
//! let unverified = parse_unverified(token)?;
//! // Look up the verification key by `unverified.header.kid`, verify, then:
//! validate_iat(claims.iat, DEFAULT_CLOCK_SKEW, now)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this are rejected before any base64 decoding or JSON
/// parsing. Identity-provider access tokens with an RS256 signature are
/// typically 800-1500 bytes, so 8KB leaves room for custom claims.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default JWT clock skew tolerance (5 minutes).
///
/// Tokens with `iat` (issued-at) timestamps more than this amount in the
/// future are rejected.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum allowed JWT clock skew tolerance (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while parsing or validating a JWT.
///
/// Error messages are intentionally generic. Detailed information is logged
/// at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token is missing required `kid` header.
    #[error("The access token is invalid or expired")]
    MissingKid,

    /// Token `iat` claim is too far in the future.
    #[error("The access token is invalid or expired")]
    IatTooFarInFuture,
}

// =============================================================================
// Unverified token parts
// =============================================================================

/// The JOSE header of a token, read before the signature is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Key ID selecting the published key that should verify the token.
    pub kid: String,

    /// Algorithm the token claims to be signed with. Untrusted.
    pub alg: String,

    /// Media type, usually "JWT".
    pub typ: Option<String>,
}

/// A decoded but unverified token.
///
/// The claims map is for diagnostics only.
#[derive(Debug, Clone)]
pub struct UnverifiedToken {
    /// Decoded header.
    pub header: TokenHeader,

    /// Decoded payload. Untrusted until the signature has been verified.
    pub claims: Map<String, Value>,
}

impl UnverifiedToken {
    /// Issuer as asserted by the unverified payload, for log correlation.
    #[must_use]
    pub fn asserted_issuer(&self) -> Option<&str> {
        self.claims.get("iss").and_then(Value::as_str)
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Split a token into its three segments.
///
/// Fails unless the token contains exactly two separators.
fn split_segments(token: &str) -> Result<(&str, &str, &str), JwtValidationError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None) => Ok((header, payload, signature)),
        _ => {
            tracing::debug!(
                target: "common.jwt",
                separators = token.matches('.').count(),
                "Token rejected: invalid JWT format"
            );
            Err(JwtValidationError::MalformedToken)
        }
    }
}

/// Decode one base64url segment as JSON.
fn decode_segment(segment: &str, name: &'static str) -> Result<Value, JwtValidationError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to decode JWT segment base64");
        JwtValidationError::MalformedToken
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to parse JWT segment JSON");
        JwtValidationError::MalformedToken
    })
}

/// Decode a JWT's header and payload without verifying the signature.
///
/// Used to discover which key the token was signed with and to log what the
/// token asserts.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing (denial-of-service prevention)
/// - This function does NOT validate the token signature
/// - The returned claims MUST NOT be used for authorization
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong number of segments, bad base64, header or
///   payload not a JSON object, or `alg` missing
/// - `MissingKid` - Header has no `kid`, or `kid` is not a non-empty string
pub fn parse_unverified(token: &str) -> Result<UnverifiedToken, JwtValidationError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let (header_part, payload_part, _signature) = split_segments(token)?;

    let Value::Object(header) = decode_segment(header_part, "header")? else {
        tracing::debug!(target: "common.jwt", "JWT header is not a JSON object");
        return Err(JwtValidationError::MalformedToken);
    };

    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MalformedToken)?;

    // Extract kid as string, rejecting empty values
    let kid = header
        .get("kid")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)?;

    let typ = header
        .get("typ")
        .and_then(Value::as_str)
        .map(ToString::to_string);

    let Value::Object(claims) = decode_segment(payload_part, "payload")? else {
        tracing::debug!(target: "common.jwt", "JWT payload is not a JSON object");
        return Err(JwtValidationError::MalformedToken);
    };

    Ok(UnverifiedToken {
        header: TokenHeader { kid, alg, typ },
        claims,
    })
}

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// # Errors
///
/// Returns `JwtValidationError::IatTooFarInFuture` if the iat timestamp is
/// more than `clock_skew` after `now`.
pub fn validate_iat(iat: i64, clock_skew: Duration, now: i64) -> Result<(), JwtValidationError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds), well within i64 range
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now.saturating_add(clock_skew_secs);

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            clock_skew_secs = clock_skew_secs,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
