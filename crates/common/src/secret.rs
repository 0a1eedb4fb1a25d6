//! Secret types for bearer credentials.
//!
//! Re-exports [`secrecy`] so that every crate in the workspace wraps raw
//! bearer tokens the same way. A `SecretString` prints as `[REDACTED]` under
//! `Debug`, so a struct deriving `Debug` that carries a credential can be
//! passed to `tracing` without leaking the token.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct Presented {
//!     scheme: &'static str,
//!     credential: SecretString,
//! }
//!
//! let presented = Presented {
//!     scheme: "Bearer",
//!     credential: SecretString::from("eyJhbGciOiJSUzI1NiJ9.e30.c2ln"),
//! };
//!
//! assert!(!format!("{presented:?}").contains("eyJ"));
//! assert!(presented.credential.expose_secret().starts_with("eyJ"));
//! ```

pub use secrecy::{ExposeSecret, SecretString};
