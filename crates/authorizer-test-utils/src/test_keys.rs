//! Signing keypairs built from the fixed RSA fixtures.
//!
//! A `TestKeypair` signs RS256 tokens and renders itself as a JWK in either
//! of the representations an identity provider may publish.

use crate::crypto_fixtures::{
    PRIMARY_CERT_X5C, PRIMARY_MODULUS_N, PRIMARY_PRIVATE_KEY_PEM, ROGUE_CERT_X5C, ROGUE_MODULUS_N,
    ROGUE_PRIVATE_KEY_PEM, RSA_EXPONENT_E,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

/// Key ID used for the primary key in most tests.
pub const TEST_KID: &str = "test-key-01";

/// RSA keypair with a fixed key ID.
#[derive(Debug, Clone)]
pub struct TestKeypair {
    kid: String,
    private_key_pem: &'static str,
    cert_x5c: &'static str,
    modulus_n: &'static str,
}

impl TestKeypair {
    /// The key published by the test issuer.
    pub fn primary(kid: &str) -> Self {
        Self {
            kid: kid.to_string(),
            private_key_pem: PRIMARY_PRIVATE_KEY_PEM,
            cert_x5c: PRIMARY_CERT_X5C,
            modulus_n: PRIMARY_MODULUS_N,
        }
    }

    /// A key nobody publishes. Pair it with the primary key's kid to forge
    /// a token that names a real key but carries the wrong signature.
    pub fn rogue(kid: &str) -> Self {
        Self {
            kid: kid.to_string(),
            private_key_pem: ROGUE_PRIVATE_KEY_PEM,
            cert_x5c: ROGUE_CERT_X5C,
            modulus_n: ROGUE_MODULUS_N,
        }
    }

    /// Key ID placed in token headers and JWKs.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// First `x5c` entry for this key.
    pub fn cert_x5c(&self) -> &str {
        self.cert_x5c
    }

    /// Sign `claims` with RS256 and this keypair's kid.
    pub fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.kid.clone());
        self.sign_with_header(&header, claims)
    }

    /// Sign `claims` with an explicit header. The header's `alg` must be an
    /// RSA algorithm.
    pub fn sign_with_header(&self, header: &Header, claims: &Value) -> String {
        let encoding_key = EncodingKey::from_rsa_pem(self.private_key_pem.as_bytes())
            .expect("fixture private key should parse");
        encode(header, claims, &encoding_key).expect("Failed to sign token")
    }

    /// JWK publishing the key through its certificate chain, the shape
    /// Auth0-style issuers serve.
    pub fn jwk_json(&self) -> Value {
        json!({
            "alg": "RS256",
            "kty": "RSA",
            "use": "sig",
            "kid": self.kid,
            "n": self.modulus_n,
            "e": RSA_EXPONENT_E,
            "x5c": [self.cert_x5c],
        })
    }

    /// JWK publishing only the modulus and exponent.
    pub fn jwk_components_json(&self) -> Value {
        json!({
            "alg": "RS256",
            "kty": "RSA",
            "use": "sig",
            "kid": self.kid,
            "n": self.modulus_n,
            "e": RSA_EXPONENT_E,
        })
    }

    /// JWK publishing only the certificate chain.
    pub fn jwk_certificate_only_json(&self) -> Value {
        json!({
            "kty": "RSA",
            "use": "sig",
            "kid": self.kid,
            "x5c": [self.cert_x5c],
        })
    }
}

/// Wrap JWKs in a key-set document.
pub fn jwks_document(keys: Vec<Value>) -> Value {
    json!({ "keys": keys })
}
