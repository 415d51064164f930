//! The per-session protocol state machine.
//!
//! An engine starts `Uninitialized` and becomes `Active` exactly once, when
//! it accepts an `initialize` call. Tool calls and catalog listing are only
//! served while `Active`. The transition is a set-once cell, so concurrent
//! callers on the same session see either state in full, never a mix.

use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::tools::ToolRegistry;
use crate::types::{Call, CallKind, InitializeParams, McpError, McpResult, ToolListResult};

use super::negotiation::NegotiatedSession;

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created, handshake not done.
    Uninitialized,
    /// Handshake done; tools may be called.
    Active,
}

/// Interprets calls for one session.
pub struct ProtocolEngine {
    registry: Arc<ToolRegistry>,
    negotiated: OnceLock<NegotiatedSession>,
}

impl ProtocolEngine {
    /// Fresh, uninitialized engine over a shared tool catalog.
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            negotiated: OnceLock::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        if self.negotiated.get().is_some() {
            EngineState::Active
        } else {
            EngineState::Uninitialized
        }
    }

    /// Handshake outcome, once `Active`.
    pub fn negotiated(&self) -> Option<&NegotiatedSession> {
        self.negotiated.get()
    }

    /// Handle one call and produce its result payload.
    pub async fn handle(&self, mut call: Call) -> McpResult<Value> {
        let args = std::mem::take(&mut call.args);
        match call.kind() {
            CallKind::Initialize => self.initialize(args),
            CallKind::ListTools => {
                self.ensure_active()?;
                let result = ToolListResult {
                    tools: self.registry.list_tools(),
                    next_cursor: None,
                };
                serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
            }
            CallKind::Tool(name) => {
                self.ensure_active()?;
                let tool = self.registry.get(name)?;
                tracing::debug!("Invoking tool {name}");
                tool.invoke(args).await
            }
            CallKind::Terminate => Err(McpError::InvalidRequest(
                "terminate is handled by the dispatcher".to_string(),
            )),
            CallKind::Other(method) => Err(McpError::MethodNotFound(method.to_string())),
            CallKind::Empty => Err(McpError::InvalidRequest(
                "call names neither a method nor a tool".to_string(),
            )),
        }
    }

    fn initialize(&self, args: Value) -> McpResult<Value> {
        let params: InitializeParams = match args {
            Value::Null => InitializeParams::default(),
            other => serde_json::from_value(other)
                .map_err(|e| McpError::InvalidRequest(format!("initialize params: {e}")))?,
        };

        let negotiated = NegotiatedSession::from_params(params);
        let result = negotiated.result();
        if self.negotiated.set(negotiated).is_err() {
            return Err(McpError::ProtocolState(
                "Session already initialized".to_string(),
            ));
        }

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn ensure_active(&self) -> McpResult<()> {
        if self.negotiated.get().is_none() {
            return Err(McpError::ProtocolState(
                "Session not yet initialized. Send 'initialize' first".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProtocolEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolEngine")
            .field("state", &self.state())
            .field("tools", &self.registry.len())
            .finish()
    }
}
