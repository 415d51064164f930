//! SQLite-backed storage.

use std::path::PathBuf;
use std::sync::Mutex;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde_json::{Map, Number, Value};

use crate::error::{StorageError, StorageResult};
use crate::storage::{Row, Storage};

/// SQLite connection settings.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file path (`:memory:` for an in-memory database).
    pub path: PathBuf,
    /// Enable WAL mode for better read concurrency.
    pub wal_mode: bool,
    /// Milliseconds to wait on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/dr-records.db"),
            wal_mode: true,
            busy_timeout_ms: 5_000,
        }
    }
}

impl SqliteConfig {
    /// Config for an in-memory database.
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            wal_mode: false, // WAL not supported for in-memory
            busy_timeout_ms: 0,
        }
    }

    /// Config with a custom path and default pragmas.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Thread-safe SQLite storage handle.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    config: SqliteConfig,
}

impl SqliteStorage {
    /// Open or create a database.
    pub fn open(config: SqliteConfig) -> StorageResult<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let conn = Connection::open_with_flags(&config.path, flags)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        if config.busy_timeout_ms > 0 {
            conn.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))?;
        }

        log::info!("Opened record store at {}", config.path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            config,
        })
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::open(SqliteConfig::in_memory())
    }

    /// Configuration this handle was opened with.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Run a batch of statements without parameters (schema setup).
    pub fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }
}

impl Storage for SqliteStorage {
    fn query(&self, sql: &str, params: &[Value]) -> StorageResult<Vec<Row>> {
        let bound = bind_params(params)?;
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(bound))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut obj = Map::with_capacity(columns.len());
            for (i, name) in columns.iter().enumerate() {
                obj.insert(name.clone(), to_json(row.get_ref(i)?));
            }
            out.push(obj);
        }
        log::trace!("query returned {} rows", out.len());
        Ok(out)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> StorageResult<usize> {
        let bound = bind_params(params)?;
        let conn = self.lock()?;
        let affected = conn.execute(sql, params_from_iter(bound))?;
        Ok(affected)
    }
}

fn bind_params(params: &[Value]) -> StorageResult<Vec<SqlValue>> {
    params
        .iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Null => Ok(SqlValue::Null),
            Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
            Value::Number(n) => n
                .as_i64()
                .map(SqlValue::Integer)
                .or_else(|| n.as_f64().map(SqlValue::Real))
                .ok_or_else(|| StorageError::Parameter {
                    index,
                    reason: format!("number {n} out of range"),
                }),
            Value::String(s) => Ok(SqlValue::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(StorageError::Parameter {
                index,
                reason: "only scalar values can be bound".to_string(),
            }),
        })
        .collect()
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn binds_scalars_and_rejects_containers() {
        let bound = bind_params(&[json!(null), json!(true), json!(7), json!(1.5), json!("x")])
            .unwrap();
        assert_eq!(bound.len(), 5);
        assert_eq!(bound[1], SqlValue::Integer(1));
        assert_eq!(bound[3], SqlValue::Real(1.5));

        let err = bind_params(&[json!("ok"), json!([1, 2])]).unwrap_err();
        assert!(matches!(err, StorageError::Parameter { index: 1, .. }));
    }

    #[test]
    fn query_maps_columns_to_json() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let rows = storage
            .query("SELECT 1 AS n, 'a' AS s, NULL AS z, 2.5 AS r", &[])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["n"], json!(1));
        assert_eq!(rows[0]["s"], json!("a"));
        assert_eq!(rows[0]["z"], Value::Null);
        assert_eq!(rows[0]["r"], json!(2.5));
    }

    #[test]
    fn bad_sql_is_a_storage_error() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let err = storage.query("SELECT * FROM nowhere", &[]).unwrap_err();
        assert!(matches!(err, StorageError::Sqlite(_)));
        assert!(storage.ping().is_ok());
    }
}
