//! Tool catalog: registry plus the built-in record tools.

pub mod registry;

pub mod case_get;
pub mod case_list;
pub mod event_list;
pub mod lead_create;
pub mod lead_list;
pub mod ping;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use dr_records::{Storage, StorageResult};

use crate::types::{McpError, McpResult};

pub use registry::{RegisteredTool, ToolHandler, ToolRegistry};

/// Default page size for list tools.
pub(crate) const DEFAULT_LIMIT: i64 = 50;

/// Deserialize already-validated arguments into a tool's parameter struct.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> McpResult<T> {
    serde_json::from_value(args).map_err(|e| McpError::ArgumentValidation {
        tool: tool.to_string(),
        detail: e.to_string(),
    })
}

/// Run a blocking storage operation on tokio's blocking pool.
pub(crate) async fn with_storage<T, F>(storage: &Arc<dyn Storage>, op: F) -> McpResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn Storage) -> StorageResult<T> + Send + 'static,
{
    let storage = Arc::clone(storage);
    tokio::task::spawn_blocking(move || op(storage.as_ref()))
        .await
        .map_err(|e| McpError::InternalError(format!("storage task failed: {e}")))?
        .map_err(McpError::from)
}
