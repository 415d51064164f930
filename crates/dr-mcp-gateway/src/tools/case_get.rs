//! `get_case` tool. One case with its scheduled events.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use dr_records::{Storage, StorageError};

use crate::types::{McpResult, ToolDefinition};

use super::{parse_args, with_storage, ToolHandler};

#[derive(Debug, Deserialize)]
struct GetParams {
    case_id: i64,
}

/// Return the tool definition for get_case.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_case".to_string(),
        description: Some("Fetch a case by id together with its events".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "case_id": { "type": "integer", "minimum": 1 }
            },
            "required": ["case_id"],
            "additionalProperties": false
        }),
    }
}

/// Handler for get_case.
pub struct GetCase {
    storage: Arc<dyn Storage>,
}

impl GetCase {
    /// Bind the handler to a record store.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ToolHandler for GetCase {
    async fn call(&self, args: Value) -> McpResult<Value> {
        let params: GetParams = parse_args("get_case", args)?;
        let case_id = params.case_id;

        let (case, events) = with_storage(&self.storage, move |s| {
            let case = s
                .query(
                    "SELECT id, number, title, client_name, court, status, opened_at, updated_at \
                     FROM cases WHERE id = ?1",
                    &[json!(case_id)],
                )?
                .into_iter()
                .next()
                .ok_or_else(|| StorageError::NotFound(format!("case {case_id} not found")))?;
            let events = s.query(
                "SELECT id, kind, description, scheduled_for, created_at \
                 FROM case_events WHERE case_id = ?1 \
                 ORDER BY scheduled_for ASC, id ASC",
                &[json!(case_id)],
            )?;
            Ok((case, events))
        })
        .await?;

        Ok(json!({
            "case": case,
            "events": events,
        }))
    }
}
