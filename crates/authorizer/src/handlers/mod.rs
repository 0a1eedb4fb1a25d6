//! HTTP request handlers for the authorizer service.

pub mod authorize;
pub mod health;
pub mod me;

pub use authorize::authorize;
pub use health::health_check;
pub use me::get_me;
