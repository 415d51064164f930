//! `create_lead` tool. Record a new prospective client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use dr_records::schema::now_timestamp;
use dr_records::{Storage, StorageError};

use crate::types::{McpError, McpResult, ToolDefinition};

use super::{parse_args, with_storage, ToolHandler};

const SQL: &str = "INSERT INTO leads (name, email, phone, source, status, created_at) \
                   VALUES (?1, ?2, ?3, ?4, 'new', ?5) \
                   RETURNING id";

#[derive(Debug, Deserialize)]
struct CreateParams {
    name: String,
    email: Option<String>,
    phone: Option<String>,
    source: Option<String>,
}

/// Return the tool definition for create_lead.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "create_lead".to_string(),
        description: Some("Create a lead with status 'new'".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "minLength": 1, "maxLength": 200 },
                "email": { "type": "string", "maxLength": 320 },
                "phone": { "type": "string", "maxLength": 40 },
                "source": { "type": "string", "maxLength": 100 }
            },
            "required": ["name"],
            "additionalProperties": false
        }),
    }
}

/// Handler for create_lead.
pub struct CreateLead {
    storage: Arc<dyn Storage>,
}

impl CreateLead {
    /// Bind the handler to a record store.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ToolHandler for CreateLead {
    async fn call(&self, args: Value) -> McpResult<Value> {
        let params: CreateParams = parse_args("create_lead", args)?;
        let name = params.name.trim().to_string();
        if name.is_empty() {
            return Err(McpError::ArgumentValidation {
                tool: "create_lead".to_string(),
                detail: "name must not be blank".to_string(),
            });
        }

        let lead_id = with_storage(&self.storage, move |s| {
            s.query(
                SQL,
                &[
                    json!(name),
                    json!(params.email),
                    json!(params.phone),
                    json!(params.source),
                    json!(now_timestamp()),
                ],
            )?
            .into_iter()
            .next()
            .and_then(|row| row.get("id").and_then(Value::as_i64))
            .ok_or_else(|| StorageError::NotFound("insert returned no id".to_string()))
        })
        .await?;

        tracing::info!("Created lead {lead_id}");
        Ok(json!({
            "lead_id": lead_id,
            "status": "new",
        }))
    }
}
