//! `list_cases` tool. Page through legal cases, optionally by status.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use dr_records::Storage;

use crate::types::{McpResult, ToolDefinition};

use super::{parse_args, with_storage, ToolHandler, DEFAULT_LIMIT};

const SQL: &str = "SELECT id, number, title, client_name, court, status, opened_at, updated_at \
                   FROM cases \
                   WHERE (?1 IS NULL OR status = ?1) \
                   ORDER BY updated_at DESC, id DESC \
                   LIMIT ?2";

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Return the tool definition for list_cases.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_cases".to_string(),
        description: Some("List legal cases, most recently updated first".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "status": { "type": "string", "enum": ["open", "closed", "archived"] },
                "limit": { "type": "integer", "minimum": 1, "maximum": 200, "default": 50 }
            },
            "additionalProperties": false
        }),
    }
}

/// Handler for list_cases.
pub struct ListCases {
    storage: Arc<dyn Storage>,
}

impl ListCases {
    /// Bind the handler to a record store.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ToolHandler for ListCases {
    async fn call(&self, args: Value) -> McpResult<Value> {
        let params: ListParams = parse_args("list_cases", args)?;
        let rows = with_storage(&self.storage, move |s| {
            s.query(SQL, &[json!(params.status), json!(params.limit)])
        })
        .await?;

        Ok(json!({
            "count": rows.len(),
            "cases": rows,
        }))
    }
}
