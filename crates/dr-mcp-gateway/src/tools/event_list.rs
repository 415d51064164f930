//! `list_events` tool. Upcoming hearings, deadlines and other case events.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use dr_records::Storage;

use crate::types::{McpResult, ToolDefinition};

use super::{parse_args, with_storage, ToolHandler, DEFAULT_LIMIT};

const SQL: &str = "SELECT e.id, e.case_id, c.number AS case_number, e.kind, e.description, \
                          e.scheduled_for \
                   FROM case_events e JOIN cases c ON c.id = e.case_id \
                   WHERE (?1 IS NULL OR e.case_id = ?1) \
                     AND (?2 IS NULL OR e.scheduled_for >= ?2) \
                   ORDER BY e.scheduled_for ASC, e.id ASC \
                   LIMIT ?3";

#[derive(Debug, Deserialize)]
struct ListParams {
    case_id: Option<i64>,
    from: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Return the tool definition for list_events.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_events".to_string(),
        description: Some(
            "List case events in chronological order, optionally for one case or from a date"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "case_id": { "type": "integer", "minimum": 1 },
                "from": {
                    "type": "string",
                    "pattern": "^[0-9]{4}-[0-9]{2}-[0-9]{2}",
                    "description": "ISO date (YYYY-MM-DD) or timestamp lower bound"
                },
                "limit": { "type": "integer", "minimum": 1, "maximum": 200, "default": 50 }
            },
            "additionalProperties": false
        }),
    }
}

/// Handler for list_events.
pub struct ListEvents {
    storage: Arc<dyn Storage>,
}

impl ListEvents {
    /// Bind the handler to a record store.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ToolHandler for ListEvents {
    async fn call(&self, args: Value) -> McpResult<Value> {
        let params: ListParams = parse_args("list_events", args)?;
        let rows = with_storage(&self.storage, move |s| {
            s.query(
                SQL,
                &[json!(params.case_id), json!(params.from), json!(params.limit)],
            )
        })
        .await?;

        Ok(json!({
            "count": rows.len(),
            "events": rows,
        }))
    }
}
