//! Shared-secret bearer authentication.

use subtle::ConstantTimeEq;

use crate::types::{McpError, McpResult};

const BEARER_PREFIX: &str = "Bearer ";

/// Validates the `Authorization` value of every inbound call.
///
/// A gate without a configured secret rejects everything: a missing secret
/// is a deployment fault, never an open door.
#[derive(Clone)]
pub struct AuthGate {
    secret: Option<String>,
}

impl AuthGate {
    /// Build a gate. Empty secrets count as unconfigured.
    pub fn new(secret: Option<String>) -> Self {
        let secret = secret.filter(|s| !s.is_empty());
        if secret.is_none() {
            tracing::warn!("No shared secret configured; every call will be rejected");
        }
        Self { secret }
    }

    /// Whether a secret is configured.
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Check a credential header value.
    pub fn check(&self, authorization: Option<&str>) -> McpResult<()> {
        let Some(secret) = self.secret.as_deref() else {
            tracing::warn!("Rejected call: shared secret not configured");
            return Err(McpError::Unauthenticated(
                "server has no shared secret configured".to_string(),
            ));
        };

        let presented = authorization
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .ok_or_else(|| {
                tracing::warn!("Rejected call: missing bearer credential");
                McpError::Unauthenticated("missing bearer credential".to_string())
            })?;

        if bool::from(presented.as_bytes().ct_eq(secret.as_bytes())) {
            Ok(())
        } else {
            tracing::warn!("Rejected call: bearer credential mismatch");
            Err(McpError::Unauthenticated(
                "invalid bearer credential".to_string(),
            ))
        }
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}
