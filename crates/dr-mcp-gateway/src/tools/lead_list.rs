//! `list_leads` tool. Prospective clients, newest first.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use dr_records::Storage;

use crate::types::{McpResult, ToolDefinition};

use super::{parse_args, with_storage, ToolHandler, DEFAULT_LIMIT};

const SQL: &str = "SELECT id, name, email, phone, source, status, created_at \
                   FROM leads \
                   WHERE (?1 IS NULL OR status = ?1) \
                   ORDER BY created_at DESC, id DESC \
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

/// Return the tool definition for list_leads.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_leads".to_string(),
        description: Some("List leads, newest first".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["new", "contacted", "converted", "lost"]
                },
                "limit": { "type": "integer", "minimum": 1, "maximum": 200, "default": 50 }
            },
            "additionalProperties": false
        }),
    }
}

/// Handler for list_leads.
pub struct ListLeads {
    storage: Arc<dyn Storage>,
}

impl ListLeads {
    /// Bind the handler to a record store.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ToolHandler for ListLeads {
    async fn call(&self, args: Value) -> McpResult<Value> {
        let params: ListParams = parse_args("list_leads", args)?;
        let rows = with_storage(&self.storage, move |s| {
            s.query(SQL, &[json!(params.status), json!(params.limit)])
        })
        .await?;

        Ok(json!({
            "count": rows.len(),
            "leads": rows,
        }))
    }
}
