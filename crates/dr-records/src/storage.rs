//! The storage contract consumed by tool handlers.

use serde_json::{Map, Value};

use crate::error::StorageResult;

/// One result row, keyed by column name.
pub type Row = Map<String, Value>;

/// Query/execute access to the record store.
///
/// Parameters are positional JSON scalars (`null`, booleans, numbers,
/// strings). Implementations are blocking; async callers should move calls
/// onto a blocking pool.
pub trait Storage: Send + Sync {
    /// Run a statement that returns rows.
    fn query(&self, sql: &str, params: &[Value]) -> StorageResult<Vec<Row>>;

    /// Run a statement that modifies rows, returning the affected count.
    fn execute(&self, sql: &str, params: &[Value]) -> StorageResult<usize>;

    /// Cheap reachability check.
    fn ping(&self) -> StorageResult<()> {
        self.query("SELECT 1 AS ok", &[]).map(|_| ())
    }
}
