//! Request and response bodies for the HTTP surface.

use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

/// Gateway authorizer event.
///
/// Every field is optional; a missing token is simply denied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeRequest {
    /// Event type, usually "TOKEN". Informational.
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,

    /// Raw `Authorization` header value.
    #[serde(default, rename = "authorizationToken")]
    pub authorization_token: Option<String>,

    /// Resource being invoked. Scopes an allow decision.
    #[serde(default, rename = "methodArn")]
    pub method_arn: Option<String>,
}
