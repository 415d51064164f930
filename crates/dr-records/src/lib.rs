//! Storage collaborator for the D&R MCP gateway.
//!
//! Exposes a minimal `query` / `execute` contract over a relational store.
//! The gateway core never sees the schema; only the tool handlers issue SQL.

pub mod error;
pub mod schema;
pub mod sqlite;
pub mod storage;

pub use error::{StorageError, StorageResult};
pub use sqlite::{SqliteConfig, SqliteStorage};
pub use storage::{Row, Storage};
