//! Shared fixtures: seeded record stores and ready-made dispatchers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use dr_mcp_gateway::types::{ToolDefinition, ToolListResult};
use dr_mcp_gateway::{AuthGate, Dispatcher, SessionStore, ToolRegistry};
use dr_records::{schema, Row, SqliteStorage, Storage, StorageError, StorageResult};

pub const SECRET: &str = "test-secret";
pub const AUTH: Option<&str> = Some("Bearer test-secret");

/// In-memory store with two cases, three events and one lead.
pub fn seeded_storage() -> Arc<SqliteStorage> {
    let storage = SqliteStorage::open_in_memory().expect("open in-memory db");
    schema::bootstrap(&storage).expect("bootstrap schema");
    storage
        .execute_batch(
            "INSERT INTO cases (number, title, client_name, court, status, opened_at, updated_at) VALUES
                ('2026-CV-001', 'Smith v. Jones', 'Smith', 'District', 'open',
                 '2026-01-10T09:00:00Z', '2026-03-01T09:00:00Z'),
                ('2025-CV-042', 'Doe Estate', 'Doe', NULL, 'closed',
                 '2025-05-02T09:00:00Z', '2025-12-20T09:00:00Z');
             INSERT INTO case_events (case_id, kind, description, scheduled_for, created_at) VALUES
                (1, 'hearing', 'Motion hearing', '2026-11-02T14:00:00Z', '2026-03-01T09:00:00Z'),
                (1, 'deadline', 'Discovery cutoff', '2026-10-20T23:59:00Z', '2026-03-01T09:00:00Z'),
                (2, 'filing', 'Final accounting', '2025-12-01T10:00:00Z', '2025-05-02T09:00:00Z');
             INSERT INTO leads (name, email, source, status, created_at) VALUES
                ('Ada Client', 'ada@example.com', 'web', 'contacted', '2026-09-01T08:00:00Z');",
        )
        .expect("seed records");
    Arc::new(storage)
}

/// Storage whose every operation fails.
pub struct FailingStorage;

impl Storage for FailingStorage {
    fn query(&self, _sql: &str, _params: &[Value]) -> StorageResult<Vec<Row>> {
        Err(StorageError::Lock("database is unavailable".to_string()))
    }

    fn execute(&self, _sql: &str, _params: &[Value]) -> StorageResult<usize> {
        Err(StorageError::Lock("database is unavailable".to_string()))
    }
}

/// Registry holding the built-in tools over `storage`.
pub fn builtin_registry(storage: Arc<dyn Storage>) -> ToolRegistry {
    ToolRegistry::with_builtin_tools(storage).expect("register built-in tools")
}

/// Register `counted`, a tool that requires `{n: integer}` and counts runs.
pub fn register_counted(registry: &mut ToolRegistry) -> Arc<AtomicUsize> {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    registry
        .register_fn(
            ToolDefinition {
                name: "counted".to_string(),
                description: Some("Counts its invocations".to_string()),
                input_schema: json!({
                    "type": "object",
                    "properties": { "n": { "type": "integer" } },
                    "required": ["n"],
                    "additionalProperties": false
                }),
            },
            move |args| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({ "n": args["n"] }))
                }
            },
        )
        .expect("register counted tool");
    runs
}

/// Dispatcher over `registry`, gated by [`SECRET`].
pub fn dispatcher(registry: ToolRegistry) -> Dispatcher {
    let store = Arc::new(SessionStore::new(Arc::new(registry)));
    Dispatcher::new(AuthGate::new(Some(SECRET.to_string())), store)
}

/// Dispatcher with built-in tools over a seeded store, plus `counted`.
pub fn seeded_dispatcher() -> (Dispatcher, Arc<AtomicUsize>) {
    let mut registry = builtin_registry(seeded_storage());
    let runs = register_counted(&mut registry);
    (dispatcher(registry), runs)
}

/// Tool names in a `tools/list` result.
pub fn tool_names(result: &Value) -> Vec<String> {
    let list: ToolListResult = serde_json::from_value(result.clone()).expect("tool list");
    list.tools.into_iter().map(|t| t.name).collect()
}
