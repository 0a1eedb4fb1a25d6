//! Signing-key selection.
//!
//! Filters a published key set down to RSA signing keys and picks the one a
//! token's `kid` names. A key qualifies when it has `use == "sig"`,
//! `kty == "RSA"`, a key ID, and either a non-empty certificate chain or
//! both modulus and exponent.

use crate::auth::jwks::Jwk;
use crate::auth::pem::cert_to_pem;
use crate::errors::AuthError;
use jsonwebtoken::DecodingKey;

/// Public-key material for one signing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// PEM certificate built from the leaf `x5c` entry.
    Certificate { pem: String },

    /// Raw RSA components, base64url.
    Components { n: String, e: String },
}

/// A usable signing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub kid: String,
    pub material: KeyMaterial,
}

impl ResolvedKey {
    /// Build the verification key.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SignatureInvalid` when the published material is
    /// not a usable RSA public key.
    pub fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        let key = match &self.material {
            KeyMaterial::Certificate { pem } => DecodingKey::from_rsa_pem(pem.as_bytes()),
            KeyMaterial::Components { n, e } => DecodingKey::from_rsa_components(n, e),
        };

        key.map_err(|e| {
            tracing::warn!(target: "authz.keys", kid = %self.kid, error = %e, "Published key is not a usable RSA key");
            AuthError::SignatureInvalid
        })
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

fn resolve(jwk: &Jwk) -> Option<ResolvedKey> {
    if jwk.key_use.as_deref() != Some("sig") || jwk.kty.as_deref() != Some("RSA") {
        return None;
    }
    let kid = non_empty(jwk.kid.as_ref())?;

    let leaf_cert = jwk
        .x5c
        .as_ref()
        .and_then(|chain| chain.first())
        .and_then(|cert| non_empty(Some(cert)));

    let material = match (leaf_cert, non_empty(jwk.n.as_ref()), non_empty(jwk.e.as_ref())) {
        (Some(cert), _, _) => KeyMaterial::Certificate {
            pem: cert_to_pem(cert),
        },
        (None, Some(n), Some(e)) => KeyMaterial::Components {
            n: n.to_string(),
            e: e.to_string(),
        },
        _ => return None,
    };

    Some(ResolvedKey {
        kid: kid.to_string(),
        material,
    })
}

/// All usable signing keys, in published order.
pub fn signing_keys(keys: &[Jwk]) -> Vec<ResolvedKey> {
    keys.iter().filter_map(resolve).collect()
}

/// Select the signing key for `kid`.
///
/// The first matching key wins when an issuer publishes duplicates.
///
/// # Errors
///
/// - `AuthError::NoSigningKeys` if the set holds no usable signing key
/// - `AuthError::KeyNotFound` if none of them has key ID `kid`
pub fn select_key(keys: &[Jwk], kid: &str) -> Result<ResolvedKey, AuthError> {
    let signing = signing_keys(keys);

    if signing.is_empty() {
        tracing::warn!(
            target: "authz.keys",
            published = keys.len(),
            "Key set contains no RSA signing keys"
        );
        return Err(AuthError::NoSigningKeys);
    }

    signing.into_iter().find(|key| key.kid == kid).ok_or_else(|| {
        tracing::debug!(target: "authz.keys", kid = %kid, "No signing key matches token kid");
        AuthError::KeyNotFound
    })
}
