//! MCP capability negotiation during initialization.

use chrono::{DateTime, Utc};

use crate::types::{
    ClientCapabilities, Implementation, InitializeParams, InitializeResult, MCP_VERSION,
    SUPPORTED_VERSIONS,
};

/// What was agreed during the `initialize` handshake.
#[derive(Debug, Clone)]
pub struct NegotiatedSession {
    /// Protocol version both sides will speak.
    pub protocol_version: String,
    /// The client's declared capabilities.
    pub client: ClientCapabilities,
    /// Client implementation info, when sent.
    pub client_info: Option<Implementation>,
    /// When the handshake completed.
    pub initialized_at: DateTime<Utc>,
}

/// Pick the protocol version: the client's if supported, else the newest.
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    match requested {
        Some(v) => SUPPORTED_VERSIONS
            .iter()
            .copied()
            .find(|supported| *supported == v)
            .unwrap_or_else(|| {
                tracing::warn!(
                    "Client requested protocol version {v}, server supports {}. Proceeding with server version.",
                    MCP_VERSION
                );
                MCP_VERSION
            }),
        None => MCP_VERSION,
    }
}

impl NegotiatedSession {
    /// Process initialize parameters.
    pub fn from_params(params: InitializeParams) -> Self {
        let protocol_version = negotiate_version(params.protocol_version.as_deref()).to_string();

        match &params.client_info {
            Some(info) => {
                tracing::info!("Initialized with client: {} v{}", info.name, info.version)
            }
            None => tracing::info!("Initialized with anonymous client"),
        }

        Self {
            protocol_version,
            client: params.capabilities,
            client_info: params.client_info,
            initialized_at: Utc::now(),
        }
    }

    /// The initialize response for this session.
    pub fn result(&self) -> InitializeResult {
        InitializeResult::for_version(&self.protocol_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_version_is_kept() {
        assert_eq!(negotiate_version(Some("2024-11-05")), "2024-11-05");
    }

    #[test]
    fn unknown_or_missing_version_falls_back_to_latest() {
        assert_eq!(negotiate_version(Some("1999-01-01")), MCP_VERSION);
        assert_eq!(negotiate_version(None), MCP_VERSION);
    }
}
