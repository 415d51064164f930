//! Storage error types.

use thiserror::Error;

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite reported a failure.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure while opening the database.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A parameter could not be bound.
    #[error("Unsupported parameter at position {index}: {reason}")]
    Parameter {
        /// Zero-based parameter position.
        index: usize,
        /// Why the value was rejected.
        reason: String,
    },

    /// The requested record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Storage result type.
pub type StorageResult<T> = Result<T, StorageError>;
