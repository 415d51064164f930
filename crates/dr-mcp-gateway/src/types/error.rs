//! Gateway error taxonomy and its JSON-RPC / envelope mappings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::message::{JsonRpcError, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    /// Invalid JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// Not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method does not exist.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Gateway-specific error codes (server error range).
pub mod mcp_error_codes {
    /// Missing, wrong or unconfigured credential.
    pub const UNAUTHENTICATED: i32 = -32001;
    /// Call arrived before `initialize` completed on the session.
    pub const NOT_INITIALIZED: i32 = -32002;
    /// Session identifier unknown or closed.
    pub const SESSION_NOT_FOUND: i32 = -32003;
    /// Tool name not registered.
    pub const TOOL_NOT_FOUND: i32 = -32004;
    /// Storage collaborator failure.
    pub const STORAGE_ERROR: i32 = -32005;
}

/// Error category reported in the `error` field of a reply envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad, missing or unconfigured credential.
    Unauthenticated,
    /// Unknown or closed session identifier.
    SessionNotFound,
    /// Call not legal in the engine's current state.
    #[serde(rename = "ProtocolStateError")]
    ProtocolState,
    /// Tool name not in the registry.
    UnknownTool,
    /// Arguments failed the tool's declared schema.
    #[serde(rename = "ArgumentValidationError")]
    ArgumentValidation,
    /// Failure reported by the storage collaborator.
    #[serde(rename = "StorageError")]
    Storage,
    /// Malformed call envelope.
    InvalidRequest,
    /// Unsupported method.
    MethodNotFound,
    /// Anything else.
    InternalError,
}

impl ErrorKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "Unauthenticated",
            ErrorKind::SessionNotFound => "SessionNotFound",
            ErrorKind::ProtocolState => "ProtocolStateError",
            ErrorKind::UnknownTool => "UnknownTool",
            ErrorKind::ArgumentValidation => "ArgumentValidationError",
            ErrorKind::Storage => "StorageError",
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::MethodNotFound => "MethodNotFound",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced anywhere in the gateway.
#[derive(Debug, Error)]
pub enum McpError {
    /// Credential rejected.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Session id never issued or already closed.
    #[error("Session not found: {0}. Send 'initialize' to open a new session")]
    SessionNotFound(String),

    /// Call not legal in the engine's current state.
    #[error("{0}")]
    ProtocolState(String),

    /// Tool name not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments failed schema validation.
    #[error("Invalid arguments for '{tool}': {detail}")]
    ArgumentValidation {
        /// Tool whose schema rejected the payload.
        tool: String,
        /// Joined violation messages.
        detail: String,
    },

    /// Storage collaborator failure, passed through verbatim.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Body was not valid JSON.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Envelope shape is wrong.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Method not supported.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Internal fault.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Startup configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<dr_records::StorageError> for McpError {
    fn from(err: dr_records::StorageError) -> Self {
        McpError::Storage(err.to_string())
    }
}

impl McpError {
    /// Envelope category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            McpError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            McpError::SessionNotFound(_) => ErrorKind::SessionNotFound,
            McpError::ProtocolState(_) => ErrorKind::ProtocolState,
            McpError::UnknownTool(_) => ErrorKind::UnknownTool,
            McpError::ArgumentValidation { .. } => ErrorKind::ArgumentValidation,
            McpError::Storage(_) => ErrorKind::Storage,
            McpError::ParseError(_) | McpError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            McpError::MethodNotFound(_) => ErrorKind::MethodNotFound,
            McpError::InternalError(_)
            | McpError::Config(_)
            | McpError::Io(_)
            | McpError::Transport(_) => ErrorKind::InternalError,
        }
    }

    /// JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            McpError::Unauthenticated(_) => mcp_error_codes::UNAUTHENTICATED,
            McpError::SessionNotFound(_) => mcp_error_codes::SESSION_NOT_FOUND,
            McpError::ProtocolState(_) => mcp_error_codes::NOT_INITIALIZED,
            McpError::UnknownTool(_) => mcp_error_codes::TOOL_NOT_FOUND,
            McpError::ArgumentValidation { .. } => error_codes::INVALID_PARAMS,
            McpError::Storage(_) => mcp_error_codes::STORAGE_ERROR,
            McpError::ParseError(_) => error_codes::PARSE_ERROR,
            McpError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            McpError::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            McpError::InternalError(_)
            | McpError::Config(_)
            | McpError::Io(_)
            | McpError::Transport(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Convert to a JSON-RPC error response for the given request.
    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError::new(id, self.code(), self.to_string())
            .with_data(serde_json::json!({ "kind": self.kind() }))
    }
}

/// Result alias used throughout the gateway.
pub type McpResult<T> = Result<T, McpError>;
