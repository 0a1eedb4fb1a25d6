//! Access decisions.
//!
//! The outcome of a check collapses here into allow or deny. Deny decisions
//! carry no information about why the request was refused; the failure kind
//! is only logged.

use crate::auth::claims::Claims;
use crate::errors::AuthError;
use serde::Serialize;

/// Resource granted when the caller does not scope the decision.
pub const WILDCARD_RESOURCE: &str = "*";

/// Principal reported on every deny.
pub const DENIED_PRINCIPAL: &str = "user";

/// Policy document version understood by the gateway.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Action granted or refused.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Verdict handed to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "AuthorizerResponse")]
pub struct AccessDecision {
    pub principal_id: String,
    pub effect: Effect,
    pub resource: String,
}

impl AccessDecision {
    /// Allow `principal_id` to invoke `resource`.
    pub fn allow(principal_id: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            principal_id: principal_id.into(),
            effect: Effect::Allow,
            resource: resource.into(),
        }
    }

    /// The uniform deny.
    pub fn deny() -> Self {
        Self {
            principal_id: DENIED_PRINCIPAL.to_string(),
            effect: Effect::Deny,
            resource: WILDCARD_RESOURCE.to_string(),
        }
    }

    /// Collapse a check outcome. Failures are logged by kind and become
    /// [`AccessDecision::deny`].
    pub fn from_outcome(outcome: Result<Claims, AuthError>, resource: &str) -> Self {
        match outcome {
            Ok(claims) => {
                tracing::debug!(target: "authz.decision", effect = "Allow", "Access granted");
                Self::allow(claims.sub, resource)
            }
            Err(err) if err.is_operational() => {
                tracing::warn!(target: "authz.decision", kind = err.kind(), "Access denied");
                Self::deny()
            }
            Err(err) => {
                tracing::debug!(target: "authz.decision", kind = err.kind(), "Access denied");
                Self::deny()
            }
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }
}

/// Wire shape of a decision.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizerResponse {
    principal_id: String,
    policy_document: PolicyDocument,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PolicyDocument {
    version: &'static str,
    statement: Vec<Statement>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Statement {
    action: &'static str,
    effect: Effect,
    resource: String,
}

impl From<AccessDecision> for AuthorizerResponse {
    fn from(decision: AccessDecision) -> Self {
        Self {
            principal_id: decision.principal_id,
            policy_document: PolicyDocument {
                version: POLICY_VERSION,
                statement: vec![Statement {
                    action: INVOKE_ACTION,
                    effect: decision.effect,
                    resource: decision.resource,
                }],
            },
        }
    }
}
