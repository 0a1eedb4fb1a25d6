//! Authorization header parsing.

use crate::errors::AuthError;
use common::secret::SecretString;

const BEARER_PREFIX: &str = "bearer ";

/// Extract the bearer credential from a raw `Authorization` header value.
///
/// The scheme is matched case-insensitively. Whitespace around the
/// credential is ignored.
///
/// # Errors
///
/// - `AuthError::MissingHeader` if the header is absent or blank
/// - `AuthError::MalformedHeader` if it is not `Bearer <token>` with a
///   single non-empty token
pub fn extract_bearer(header: Option<&str>) -> Result<SecretString, AuthError> {
    let header = header.map(str::trim).filter(|h| !h.is_empty()).ok_or_else(|| {
        tracing::debug!(target: "authz.header", "Missing Authorization header");
        AuthError::MissingHeader
    })?;

    let credential = header
        .get(..BEARER_PREFIX.len())
        .filter(|scheme| scheme.eq_ignore_ascii_case(BEARER_PREFIX))
        .and_then(|_| header.get(BEARER_PREFIX.len()..))
        .map(str::trim)
        .filter(|token| !token.is_empty() && !token.contains(char::is_whitespace))
        .ok_or_else(|| {
            tracing::debug!(target: "authz.header", "Invalid Authorization header format");
            AuthError::MalformedHeader
        })?;

    Ok(SecretString::from(credential.to_string()))
}
