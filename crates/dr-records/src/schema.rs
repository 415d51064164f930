//! Create-if-missing schema for the record store.

use crate::error::StorageResult;
use crate::sqlite::SqliteStorage;

/// Tables the tool catalog reads and writes.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cases (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    number      TEXT NOT NULL UNIQUE,
    title       TEXT NOT NULL,
    client_name TEXT NOT NULL,
    court       TEXT,
    status      TEXT NOT NULL DEFAULT 'open'
                CHECK (status IN ('open', 'closed', 'archived')),
    opened_at   TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS case_events (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id      INTEGER NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
    kind         TEXT NOT NULL,
    description  TEXT NOT NULL,
    scheduled_for TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_case_events_case ON case_events(case_id);
CREATE INDEX IF NOT EXISTS idx_case_events_scheduled ON case_events(scheduled_for);

CREATE TABLE IF NOT EXISTS leads (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    email      TEXT,
    phone      TEXT,
    source     TEXT,
    status     TEXT NOT NULL DEFAULT 'new'
               CHECK (status IN ('new', 'contacted', 'converted', 'lost')),
    created_at TEXT NOT NULL
);
"#;

/// Apply [`SCHEMA`]. Safe to run on every start.
pub fn bootstrap(storage: &SqliteStorage) -> StorageResult<()> {
    storage.execute_batch(SCHEMA)?;
    log::debug!("Record schema ready");
    Ok(())
}

/// Current UTC time in the text format stored in timestamp columns.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
