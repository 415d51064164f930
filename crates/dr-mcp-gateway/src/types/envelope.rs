//! Transport-agnostic call and reply envelopes.
//!
//! A [`Call`] names either a lifecycle method (`initialize`, `terminate`,
//! `tools/list`) or a tool. A [`Reply`] is what every surface ultimately
//! renders: `{ ok, session_id, result?, error?, message? }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ErrorKind, McpError, McpResult};

/// Lifecycle method that opens a session.
pub const METHOD_INITIALIZE: &str = "initialize";
/// Lifecycle method that closes a session.
pub const METHOD_TERMINATE: &str = "terminate";
/// Catalog listing.
pub const METHOD_LIST_TOOLS: &str = "tools/list";

/// A single inbound call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Call {
    /// Lifecycle method selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Tool selector. Takes precedence over `method`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// Argument payload.
    #[serde(default, alias = "arguments", skip_serializing_if = "Value::is_null")]
    pub args: Value,
    /// Session identifier echoed from a previous reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// What a [`Call`] asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind<'a> {
    /// Open a session and run the handshake.
    Initialize,
    /// Close a session.
    Terminate,
    /// List the tool catalog.
    ListTools,
    /// Invoke a named tool.
    Tool(&'a str),
    /// Some other method name.
    Other(&'a str),
    /// Neither method nor tool given.
    Empty,
}

impl Call {
    /// An `initialize` call with default parameters.
    pub fn initialize() -> Self {
        Self::method(METHOD_INITIALIZE)
    }

    /// A `terminate` call.
    pub fn terminate(session_id: impl Into<String>) -> Self {
        Self::method(METHOD_TERMINATE).with_session(session_id)
    }

    /// A lifecycle call by method name.
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            method: Some(name.into()),
            ..Default::default()
        }
    }

    /// A tool invocation.
    pub fn tool(name: impl Into<String>, args: Value) -> Self {
        Self {
            tool: Some(name.into()),
            args,
            ..Default::default()
        }
    }

    /// Attach a session identifier.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach an argument payload.
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    /// Classify the call.
    pub fn kind(&self) -> CallKind<'_> {
        if let Some(tool) = self.tool.as_deref() {
            return CallKind::Tool(tool);
        }
        match self.method.as_deref() {
            Some(METHOD_INITIALIZE) => CallKind::Initialize,
            Some(METHOD_TERMINATE) | Some("close") => CallKind::Terminate,
            Some(METHOD_LIST_TOOLS) => CallKind::ListTools,
            Some(other) => CallKind::Other(other),
            None => CallKind::Empty,
        }
    }
}

/// Response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Session the call ran against, if any.
    pub session_id: Option<String>,
    /// Result payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error category on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    /// Human-readable failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Reply {
    /// Successful reply.
    pub fn success(session_id: Option<String>, result: Value) -> Self {
        Self {
            ok: true,
            session_id,
            result: Some(result),
            error: None,
            message: None,
        }
    }

    /// Failed reply.
    pub fn failure(session_id: Option<String>, err: &McpError) -> Self {
        Self {
            ok: false,
            session_id,
            result: None,
            error: Some(err.kind()),
            message: Some(err.to_string()),
        }
    }

    /// Build from a call outcome.
    pub fn from_result(session_id: Option<String>, result: &McpResult<Value>) -> Self {
        match result {
            Ok(value) => Self::success(session_id, value.clone()),
            Err(err) => Self::failure(session_id, err),
        }
    }
}
