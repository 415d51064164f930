//! Tool registration and dispatch.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::Validator;
use serde_json::{Map, Value};

use dr_records::Storage;

use crate::types::{McpError, McpResult, ToolDefinition};

use super::{case_get, case_list, event_list, lead_create, lead_list, ping};

/// Maximum number of schema violations reported per call.
const MAX_REPORTED_VIOLATIONS: usize = 5;

/// A tool implementation. Arguments arrive already validated.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool.
    async fn call(&self, args: Value) -> McpResult<Value>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<Value>> + Send,
{
    async fn call(&self, args: Value) -> McpResult<Value> {
        (self.0)(args).await
    }
}

/// A registered tool: its definition, compiled schema and handler.
pub struct RegisteredTool {
    definition: ToolDefinition,
    validator: Validator,
    handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    /// The tool's public definition.
    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Check arguments against the declared schema.
    pub fn validate(&self, args: &Value) -> McpResult<()> {
        if self.validator.is_valid(args) {
            return Ok(());
        }

        let detail = self
            .validator
            .iter_errors(args)
            .take(MAX_REPORTED_VIOLATIONS)
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");

        Err(McpError::ArgumentValidation {
            tool: self.definition.name.clone(),
            detail: if detail.is_empty() {
                "arguments do not match schema".to_string()
            } else {
                detail
            },
        })
    }

    /// Validate and run. The handler never sees rejected arguments.
    pub async fn invoke(&self, args: Value) -> McpResult<Value> {
        let args = match args {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        self.validate(&args)?;
        self.handler.call(args).await
    }
}

/// Name-indexed tool catalog. Built once at startup, read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in record tools bound to `storage`.
    pub fn with_builtin_tools(storage: Arc<dyn Storage>) -> McpResult<Self> {
        let mut registry = Self::new();
        registry.register(ping::definition(), Arc::new(ping::Ping))?;
        registry.register(
            case_list::definition(),
            Arc::new(case_list::ListCases::new(storage.clone())),
        )?;
        registry.register(
            case_get::definition(),
            Arc::new(case_get::GetCase::new(storage.clone())),
        )?;
        registry.register(
            event_list::definition(),
            Arc::new(event_list::ListEvents::new(storage.clone())),
        )?;
        registry.register(
            lead_list::definition(),
            Arc::new(lead_list::ListLeads::new(storage.clone())),
        )?;
        registry.register(
            lead_create::definition(),
            Arc::new(lead_create::CreateLead::new(storage)),
        )?;
        Ok(registry)
    }

    /// Register a tool. Fails on a duplicate name or an invalid schema.
    pub fn register(
        &mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> McpResult<()> {
        if self.tools.contains_key(&definition.name) {
            return Err(McpError::Config(format!(
                "tool '{}' registered twice",
                definition.name
            )));
        }

        let validator = jsonschema::validator_for(&definition.input_schema).map_err(|e| {
            McpError::Config(format!("invalid schema for tool '{}': {e}", definition.name))
        })?;

        tracing::debug!("Registered tool {}", definition.name);
        self.tools.insert(
            definition.name.clone(),
            RegisteredTool {
                definition,
                validator,
                handler,
            },
        );
        Ok(())
    }

    /// Register a closure as a tool handler.
    pub fn register_fn<F, Fut>(&mut self, definition: ToolDefinition, f: F) -> McpResult<()>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<Value>> + Send + 'static,
    {
        self.register(definition, Arc::new(FnHandler(f)))
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> McpResult<&RegisteredTool> {
        self.tools
            .get(name)
            .ok_or_else(|| McpError::UnknownTool(name.to_string()))
    }

    /// All tool definitions, sorted by name.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition.clone()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
