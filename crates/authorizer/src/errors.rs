//! Authorizer error types.
//!
//! Every variant renders the same client-facing message. The variant itself
//! is only visible in server-side logs through [`AuthError::kind`], so a
//! caller can never learn why a token was refused.

use axum::{
    http::{header::WWW_AUTHENTICATE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::jwt::JwtValidationError;
use serde::Serialize;
use thiserror::Error;

/// Generic message returned for every authorization failure.
pub const GENERIC_AUTH_FAILURE: &str = "The access token is invalid or expired";

/// Reasons an authorization check can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No Authorization header was presented.
    #[error("The access token is invalid or expired")]
    MissingHeader,

    /// The header is not `Bearer <token>`.
    #[error("The access token is invalid or expired")]
    MalformedHeader,

    /// The credential is not a decodable JWT.
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// The issuer's key set could not be fetched or parsed.
    #[error("The access token is invalid or expired")]
    KeySetUnavailable,

    /// The key set contains no RSA signing keys.
    #[error("The access token is invalid or expired")]
    NoSigningKeys,

    /// No signing key matches the token's key ID.
    #[error("The access token is invalid or expired")]
    KeyNotFound,

    /// The RS256 signature did not verify, or the token uses another algorithm.
    #[error("The access token is invalid or expired")]
    SignatureInvalid,

    /// The token is outside its validity window: `exp` has passed or `nbf`
    /// has not been reached.
    #[error("The access token is invalid or expired")]
    TokenExpired,

    /// Issuer, audience or issued-at did not match policy.
    #[error("The access token is invalid or expired")]
    ClaimMismatch,
}

impl AuthError {
    /// Stable name of the failure, for logs only.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "MissingHeader",
            AuthError::MalformedHeader => "MalformedHeader",
            AuthError::MalformedToken => "MalformedToken",
            AuthError::KeySetUnavailable => "KeySetUnavailable",
            AuthError::NoSigningKeys => "NoSigningKeys",
            AuthError::KeyNotFound => "KeyNotFound",
            AuthError::SignatureInvalid => "SignatureInvalid",
            AuthError::TokenExpired => "TokenExpired",
            AuthError::ClaimMismatch => "ClaimMismatch",
        }
    }

    /// Whether the failure points at the issuer or the network rather than
    /// at the presented token.
    pub fn is_operational(&self) -> bool {
        matches!(self, AuthError::KeySetUnavailable | AuthError::NoSigningKeys)
    }
}

impl From<JwtValidationError> for AuthError {
    fn from(err: JwtValidationError) -> Self {
        match err {
            JwtValidationError::TokenTooLarge
            | JwtValidationError::MalformedToken
            | JwtValidationError::MissingKid => AuthError::MalformedToken,
            JwtValidationError::IatTooFarInFuture => AuthError::ClaimMismatch,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: &'static str,
}

/// Uniform 401 used by the admission-gate middleware.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: "INVALID_TOKEN",
                message: GENERIC_AUTH_FAILURE,
            },
        };

        let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();

        if let Ok(header_value) = "Bearer realm=\"authorizer\", error=\"invalid_token\"".parse() {
            response.headers_mut().insert(WWW_AUTHENTICATE, header_value);
        }

        response
    }
}
