//! RS256 signature and claim verification.
//!
//! This is the trust boundary: nothing read from a token before
//! [`JwtValidator::verify`] succeeds may influence an authorization decision.
//!
//! # Security
//!
//! - Only RS256 is accepted, whatever the token header asserts
//! - Expiry and not-before are checked against the injected clock with no
//!   leeway
//! - Issued-at is checked with the configured clock skew tolerance
//! - Generic error messages prevent information leakage

use crate::auth::claims::Claims;
use crate::auth::keys::ResolvedKey;
use crate::clock::Clock;
use crate::errors::AuthError;
use common::jwt::{validate_iat, DEFAULT_CLOCK_SKEW};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::sync::Arc;
use std::time::Duration;

/// Claim requirements beyond a valid signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPolicy {
    /// Required audience. `None` accepts any.
    pub audience: Option<String>,

    /// Required issuer. `None` accepts any.
    pub issuer: Option<String>,

    /// How far in the future `iat` may be.
    pub clock_skew: Duration,
}

impl Default for ClaimPolicy {
    fn default() -> Self {
        Self {
            audience: None,
            issuer: None,
            clock_skew: DEFAULT_CLOCK_SKEW,
        }
    }
}

/// Verifies tokens against a resolved key.
pub struct JwtValidator {
    policy: ClaimPolicy,
    clock: Arc<dyn Clock>,
}

impl JwtValidator {
    pub fn new(policy: ClaimPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    pub fn policy(&self) -> &ClaimPolicy {
        &self.policy
    }

    /// Verify `token` with `key` and return its claims.
    ///
    /// # Security Checks
    ///
    /// 1. Header algorithm must be RS256
    /// 2. RSA signature must verify with the resolved key
    /// 3. `exp` must be after now
    /// 4. `nbf`, when present, must not be after now
    /// 5. `iat` must not be beyond the clock skew tolerance
    /// 6. Issuer and audience must match policy when configured
    ///
    /// # Errors
    ///
    /// - `AuthError::SignatureInvalid` for a wrong algorithm, unusable key
    ///   or failed signature
    /// - `AuthError::TokenExpired` if `exp` has passed or `nbf` has not
    ///   been reached
    /// - `AuthError::ClaimMismatch` for `iat`, issuer or audience failures
    /// - `AuthError::MalformedToken` if the payload lacks required claims
    pub fn verify(&self, token: &str, key: &ResolvedKey) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(target: "authz.jwt", error = %e, "Token header rejected");
            AuthError::SignatureInvalid
        })?;

        if header.alg != Algorithm::RS256 {
            tracing::debug!(target: "authz.jwt", alg = ?header.alg, "Token algorithm is not RS256");
            return Err(AuthError::SignatureInvalid);
        }

        let decoding_key = key.decoding_key()?;

        // exp, nbf, iss and aud are checked below against the injected clock
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;

        let claims = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(target: "authz.jwt", error = %e, "Token verification failed");
                map_jwt_error(e.kind())
            })?
            .claims;

        let now = self.clock.now().timestamp();

        if claims.exp <= now {
            tracing::debug!(target: "authz.jwt", exp = claims.exp, now = now, "Token expired");
            return Err(AuthError::TokenExpired);
        }

        if let Some(nbf) = claims.nbf {
            if nbf > now {
                tracing::debug!(target: "authz.jwt", nbf = nbf, now = now, "Token not yet valid");
                return Err(AuthError::TokenExpired);
            }
        }

        validate_iat(claims.iat, self.policy.clock_skew, now).map_err(AuthError::from)?;

        if let Some(issuer) = &self.policy.issuer {
            if &claims.iss != issuer {
                tracing::debug!(target: "authz.jwt", iss = %claims.iss, "Token issuer mismatch");
                return Err(AuthError::ClaimMismatch);
            }
        }

        if let Some(audience) = &self.policy.audience {
            if !claims.aud.contains(audience) {
                tracing::debug!(target: "authz.jwt", aud = ?claims.aud.values(), "Token audience mismatch");
                return Err(AuthError::ClaimMismatch);
            }
        }

        Ok(claims)
    }
}

fn map_jwt_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::InvalidKeyFormat => AuthError::SignatureInvalid,
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer | ErrorKind::InvalidSubject => {
            AuthError::ClaimMismatch
        }
        _ => AuthError::MalformedToken,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::auth::jwks::Jwk;
    use crate::auth::keys::select_key;
    use crate::clock::ManualClock;
    use authorizer_test_utils::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::{TimeZone, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.timestamp_opt(NOW, 0).single().unwrap()))
    }

    fn primary_key() -> ResolvedKey {
        let jwk: Jwk = serde_json::from_value(TestKeypair::primary(TEST_KID).jwk_json()).unwrap();
        select_key(&[jwk], TEST_KID).unwrap()
    }

    fn validator(policy: ClaimPolicy) -> JwtValidator {
        JwtValidator::new(policy, clock())
    }

    fn claims() -> TestTokenBuilder {
        TestTokenBuilder::new().issued_at(NOW).expires_at(NOW + 3600)
    }

    fn sign(claims: &serde_json::Value) -> String {
        TestKeypair::primary(TEST_KID).sign(claims)
    }

    #[test]
    fn test_valid_token() {
        let token = sign(&claims().for_user("auth0|alice").build());
        let claims = validator(ClaimPolicy::default()).verify(&token, &primary_key()).unwrap();

        assert_eq!(claims.sub, "auth0|alice");
        assert_eq!(claims.iss, TEST_ISSUER);
    }

    #[test]
    fn test_components_key_verifies() {
        let jwk: Jwk =
            serde_json::from_value(TestKeypair::primary(TEST_KID).jwk_components_json()).unwrap();
        let key = select_key(&[jwk], TEST_KID).unwrap();
        let token = sign(&claims().build());

        assert!(validator(ClaimPolicy::default()).verify(&token, &key).is_ok());
    }

    #[test]
    fn test_wrong_key_is_signature_invalid() {
        let token = TestKeypair::rogue(TEST_KID).sign(&claims().build());
        let result = validator(ClaimPolicy::default()).verify(&token, &primary_key());

        assert_eq!(result.unwrap_err(), AuthError::SignatureInvalid);
    }

    #[test]
    fn test_flipped_signature_byte_is_signature_invalid() {
        let token = sign(&claims().build());
        let (signed, signature) = token.rsplit_once('.').unwrap();
        let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
        bytes[10] ^= 0x01;
        let tampered = format!("{}.{}", signed, URL_SAFE_NO_PAD.encode(bytes));

        let result = validator(ClaimPolicy::default()).verify(&tampered, &primary_key());
        assert_eq!(result.unwrap_err(), AuthError::SignatureInvalid);
    }

    #[test]
    fn test_hs256_token_is_signature_invalid() {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(TEST_KID.to_string());
        let token = encode(
            &header,
            &claims().build(),
            &EncodingKey::from_secret(PRIMARY_MODULUS_N.as_bytes()),
        )
        .unwrap();

        let result = validator(ClaimPolicy::default()).verify(&token, &primary_key());
        assert_eq!(result.unwrap_err(), AuthError::SignatureInvalid);
    }

    #[test]
    fn test_rs512_token_is_signature_invalid() {
        let mut header = Header::new(Algorithm::RS512);
        header.kid = Some(TEST_KID.to_string());
        let token = TestKeypair::primary(TEST_KID).sign_with_header(&header, &claims().build());

        let result = validator(ClaimPolicy::default()).verify(&token, &primary_key());
        assert_eq!(result.unwrap_err(), AuthError::SignatureInvalid);
    }

    #[test]
    fn test_none_algorithm_is_signature_invalid() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","kid":"test-key-01"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims().build().to_string());
        let token = format!("{header}.{payload}.");

        let result = validator(ClaimPolicy::default()).verify(&token, &primary_key());
        assert_eq!(result.unwrap_err(), AuthError::SignatureInvalid);
    }

    #[test]
    fn test_expiry_boundary() {
        let validator = validator(ClaimPolicy::default());

        let at_now = sign(&claims().expires_at(NOW).build());
        assert_eq!(
            validator.verify(&at_now, &primary_key()).unwrap_err(),
            AuthError::TokenExpired
        );

        let one_second_left = sign(&claims().expires_at(NOW + 1).build());
        assert!(validator.verify(&one_second_left, &primary_key()).is_ok());
    }

    #[test]
    fn test_not_before_boundary() {
        let validator = validator(ClaimPolicy::default());

        let tomorrow = sign(&claims().with_claim("nbf", json!(NOW + 86_400)).build());
        assert_eq!(
            validator.verify(&tomorrow, &primary_key()).unwrap_err(),
            AuthError::TokenExpired
        );

        let one_second_early = sign(&claims().with_claim("nbf", json!(NOW + 1)).build());
        assert_eq!(
            validator.verify(&one_second_early, &primary_key()).unwrap_err(),
            AuthError::TokenExpired
        );

        let at_now = sign(&claims().with_claim("nbf", json!(NOW)).build());
        assert_eq!(validator.verify(&at_now, &primary_key()).unwrap().nbf, Some(NOW));
    }

    #[test]
    fn test_not_before_follows_clock() {
        let clock = clock();
        let validator = JwtValidator::new(ClaimPolicy::default(), clock.clone());
        let token = sign(&claims().with_claim("nbf", json!(NOW + 30)).build());

        assert_eq!(
            validator.verify(&token, &primary_key()).unwrap_err(),
            AuthError::TokenExpired
        );
        clock.advance(30);
        assert!(validator.verify(&token, &primary_key()).is_ok());
    }

    #[test]
    fn test_expiry_follows_clock() {
        let clock = clock();
        let validator = JwtValidator::new(ClaimPolicy::default(), clock.clone());
        let token = sign(&claims().expires_at(NOW + 60).build());

        assert!(validator.verify(&token, &primary_key()).is_ok());
        clock.advance(60);
        assert_eq!(
            validator.verify(&token, &primary_key()).unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[test]
    fn test_iat_in_future_beyond_skew() {
        let validator = validator(ClaimPolicy {
            clock_skew: Duration::from_secs(300),
            ..ClaimPolicy::default()
        });

        let within = sign(&claims().issued_at(NOW + 300).build());
        assert!(validator.verify(&within, &primary_key()).is_ok());

        let beyond = sign(&claims().issued_at(NOW + 301).build());
        assert_eq!(
            validator.verify(&beyond, &primary_key()).unwrap_err(),
            AuthError::ClaimMismatch
        );
    }

    #[test]
    fn test_issuer_policy() {
        let validator = validator(ClaimPolicy {
            issuer: Some(TEST_ISSUER.to_string()),
            ..ClaimPolicy::default()
        });

        let good = sign(&claims().build());
        assert!(validator.verify(&good, &primary_key()).is_ok());

        let bad = sign(&claims().issued_by("https://evil.test/").build());
        assert_eq!(
            validator.verify(&bad, &primary_key()).unwrap_err(),
            AuthError::ClaimMismatch
        );
    }

    #[test]
    fn test_audience_policy() {
        let validator = validator(ClaimPolicy {
            audience: Some(TEST_AUDIENCE.to_string()),
            ..ClaimPolicy::default()
        });

        let single = sign(&claims().for_audience(TEST_AUDIENCE).build());
        assert!(validator.verify(&single, &primary_key()).is_ok());

        let array = sign(
            &claims()
                .for_audiences(&["https://issuer.test/userinfo", TEST_AUDIENCE])
                .build(),
        );
        assert!(validator.verify(&array, &primary_key()).is_ok());

        let other = sign(&claims().for_audience("https://other.test").build());
        assert_eq!(
            validator.verify(&other, &primary_key()).unwrap_err(),
            AuthError::ClaimMismatch
        );
    }

    #[test]
    fn test_missing_required_claim_is_malformed() {
        let token = sign(&json!({ "iss": TEST_ISSUER, "exp": NOW + 3600, "iat": NOW }));
        let result = validator(ClaimPolicy::default()).verify(&token, &primary_key());

        assert_eq!(result.unwrap_err(), AuthError::MalformedToken);
    }

    #[test]
    fn test_map_jwt_error() {
        assert_eq!(map_jwt_error(&ErrorKind::InvalidSignature), AuthError::SignatureInvalid);
        assert_eq!(map_jwt_error(&ErrorKind::ExpiredSignature), AuthError::TokenExpired);
        assert_eq!(map_jwt_error(&ErrorKind::ImmatureSignature), AuthError::TokenExpired);
        assert_eq!(map_jwt_error(&ErrorKind::InvalidAudience), AuthError::ClaimMismatch);
        assert_eq!(map_jwt_error(&ErrorKind::InvalidToken), AuthError::MalformedToken);
    }
}
