//! Bearer-token authorization.
//!
//! # Components
//!
//! - `header` - Authorization header parsing
//! - `jwks` - Key-set fetching and TTL caching
//! - `pem` - Certificate to PEM conversion
//! - `keys` - Signing-key filtering and selection by `kid`
//! - `jwt` - RS256 signature and claim verification
//! - `claims` - Verified claims
//! - `decision` - Allow/deny decisions in the gateway's policy shape
//! - `authorizer` - The end-to-end check

pub mod authorizer;
pub mod claims;
pub mod decision;
pub mod header;
pub mod jwks;
pub mod jwt;
pub mod keys;
pub mod pem;

pub use authorizer::Authorizer;
pub use claims::{Audience, Claims};
pub use decision::{AccessDecision, Effect};
pub use jwks::{HttpKeySetFetcher, Jwk, KeySetCache, KeySetFetcher};
pub use jwt::{ClaimPolicy, JwtValidator};
pub use keys::{select_key, KeyMaterial, ResolvedKey};
