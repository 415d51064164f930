//! `ping` tool. Liveness check that echoes a message back.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpResult, ToolDefinition};

use super::{parse_args, ToolHandler};

#[derive(Debug, Deserialize)]
struct PingParams {
    message: Option<String>,
}

/// Return the tool definition for ping.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "ping".to_string(),
        description: Some("Check that the gateway answers; echoes the message".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "maxLength": 1000 }
            },
            "additionalProperties": false
        }),
    }
}

/// Handler for ping.
pub struct Ping;

#[async_trait]
impl ToolHandler for Ping {
    async fn call(&self, args: Value) -> McpResult<Value> {
        let params: PingParams = parse_args("ping", args)?;
        Ok(json!({
            "pong": true,
            "echo": params.message,
        }))
    }
}
