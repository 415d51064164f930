//! JSON-RPC 2.0 rendering of the dispatcher for MCP clients.
//!
//! Lifecycle and tool requests are translated into [`Call`]s; the session id
//! travels in the `Mcp-Session-Id` header rather than the body.

use serde_json::{json, Value};

use crate::dispatch::Dispatcher;
use crate::types::{
    Call, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, McpError, RequestId, ToolCallParams,
    ToolCallResult, JSONRPC_VERSION, METHOD_INITIALIZE, METHOD_LIST_TOOLS,
};

/// What the HTTP layer should send back for one JSON-RPC body.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    /// A response object.
    Respond {
        /// Session to stamp into `Mcp-Session-Id`.
        session_id: Option<String>,
        /// Whether the credential was rejected (rendered as HTTP 401).
        unauthenticated: bool,
        /// Serialized JSON-RPC response or error.
        body: Value,
    },
    /// Notification accepted; nothing to send.
    Accepted,
}

impl RpcOutcome {
    fn error(id: RequestId, err: &McpError) -> Self {
        RpcOutcome::Respond {
            session_id: None,
            unauthenticated: matches!(err, McpError::Unauthenticated(_)),
            body: to_value(err.to_json_rpc_error(id)),
        }
    }
}

fn to_value<T: serde::Serialize>(msg: T) -> Value {
    serde_json::to_value(msg).unwrap_or_else(|e| {
        json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": null,
            "error": { "code": -32603, "message": e.to_string() }
        })
    })
}

/// Handle one raw JSON-RPC body.
pub async fn handle_body(
    dispatcher: &Dispatcher,
    authorization: Option<&str>,
    session_header: Option<&str>,
    body: &[u8],
) -> RpcOutcome {
    let raw: Value = match serde_json::from_slice(body) {
        Ok(raw) => raw,
        Err(e) => return RpcOutcome::error(RequestId::Null, &McpError::ParseError(e.to_string())),
    };

    if raw.is_array() {
        return RpcOutcome::error(
            RequestId::Null,
            &McpError::InvalidRequest("batch requests are not supported".to_string()),
        );
    }

    if !raw.is_object() {
        return RpcOutcome::error(
            RequestId::Null,
            &McpError::InvalidRequest("message must be a JSON object".to_string()),
        );
    }

    let id = match raw.get("id") {
        None => RequestId::Null,
        Some(id) => match serde_json::from_value(id.clone()) {
            Ok(id) => id,
            Err(_) => {
                return RpcOutcome::error(
                    RequestId::Null,
                    &McpError::InvalidRequest("id must be a string, number or null".to_string()),
                )
            }
        },
    };

    if raw.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return RpcOutcome::error(
            id,
            &McpError::InvalidRequest("jsonrpc must be \"2.0\"".to_string()),
        );
    }

    let message: JsonRpcMessage = match serde_json::from_value(raw) {
        Ok(message) => message,
        Err(e) => return RpcOutcome::error(id, &McpError::InvalidRequest(e.to_string())),
    };

    match message {
        JsonRpcMessage::Request(request) => {
            handle_request(dispatcher, authorization, session_header, request).await
        }
        JsonRpcMessage::Notification(notification) => {
            if let Err(err) = dispatcher.authenticate(authorization) {
                return RpcOutcome::error(RequestId::Null, &err);
            }
            tracing::debug!("Notification {} accepted", notification.method);
            RpcOutcome::Accepted
        }
    }
}

async fn handle_request(
    dispatcher: &Dispatcher,
    authorization: Option<&str>,
    session_header: Option<&str>,
    request: JsonRpcRequest,
) -> RpcOutcome {
    let JsonRpcRequest {
        id, method, params, ..
    } = request;
    let params = params.unwrap_or(Value::Null);

    let (call, wrap_tool_result) = match method.as_str() {
        "ping" => {
            return match dispatcher.authenticate(authorization) {
                Ok(()) => RpcOutcome::Respond {
                    session_id: session_header.map(str::to_string),
                    unauthenticated: false,
                    body: to_value(JsonRpcResponse::new(id, json!({}))),
                },
                Err(err) => RpcOutcome::error(id, &err),
            };
        }
        METHOD_INITIALIZE => (Call::initialize().with_args(params), false),
        METHOD_LIST_TOOLS => (Call::method(METHOD_LIST_TOOLS), false),
        "tools/call" => match serde_json::from_value::<ToolCallParams>(params) {
            Ok(p) => (Call::tool(p.name, p.arguments.unwrap_or(Value::Null)), true),
            Err(e) => {
                if let Err(err) = dispatcher.authenticate(authorization) {
                    return RpcOutcome::error(id, &err);
                }
                let err = McpError::ArgumentValidation {
                    tool: "tools/call".to_string(),
                    detail: e.to_string(),
                };
                return RpcOutcome::error(id, &err);
            }
        },
        other => {
            // Unsupported methods never open a session.
            let err = match dispatcher.authenticate(authorization) {
                Ok(()) => McpError::MethodNotFound(other.to_string()),
                Err(err) => err,
            };
            return RpcOutcome::error(id, &err);
        }
    };

    let call = match session_header {
        Some(session) => call.with_session(session),
        None => call,
    };

    let dispatched = dispatcher.dispatch(authorization, call).await;
    match dispatched.result {
        Ok(value) => {
            let result = if wrap_tool_result {
                to_value(ToolCallResult::json(value))
            } else {
                value
            };
            RpcOutcome::Respond {
                session_id: dispatched.session_id,
                unauthenticated: false,
                body: to_value(JsonRpcResponse::new(id, result)),
            }
        }
        Err(err) => {
            let unauthenticated = matches!(err, McpError::Unauthenticated(_));
            RpcOutcome::Respond {
                session_id: dispatched.session_id,
                unauthenticated,
                body: to_value(err.to_json_rpc_error(id)),
            }
        }
    }
}
