//! Connection, schema, and read helpers for the inventory database.

use rusqlite::Connection;
use std::path::Path;

use crate::error::{CollectError, CollectResult};

/// WAL tuning pragmas (synchronous, autocheckpoint, size limit). Use after PRAGMA journal_mode = WAL.
const WAL_PRAGMAS: &str = r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 10000;
        PRAGMA journal_size_limit = 67108864;
        "#;

/// Entities keyed by (inventory, schema, collection, reference); parts record what each Run wrote.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    inventory TEXT NOT NULL,
    schema_name TEXT NOT NULL,
    collection TEXT NOT NULL,
    reference TEXT NOT NULL,
    data TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    last_run TEXT NOT NULL,
    last_part TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (inventory, schema_name, collection, reference)
);
CREATE INDEX IF NOT EXISTS idx_entities_sweep
    ON entities(inventory, schema_name, collection, active);

CREATE TABLE IF NOT EXISTS parts (
    inventory TEXT NOT NULL,
    schema_name TEXT NOT NULL,
    run_id TEXT NOT NULL,
    part_id TEXT NOT NULL,
    ordinal INTEGER NOT NULL,
    rows INTEGER NOT NULL,
    written_at INTEGER NOT NULL,
    PRIMARY KEY (run_id, part_id, ordinal)
);
CREATE INDEX IF NOT EXISTS idx_parts_run ON parts(inventory, schema_name, run_id);
"#;

/// Open or create the inventory DB with WAL and schema.
pub fn open_db(path: &Path) -> CollectResult<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| CollectError::transient(format!("open {}", path.display()), e))?;
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .map_err(|e| CollectError::transient("enable WAL", e))?;
    conn.execute_batch(WAL_PRAGMAS)
        .map_err(|e| CollectError::transient("set WAL pragmas", e))?;
    conn.execute_batch(SCHEMA)
        .map_err(|e| CollectError::transient("create schema", e))?;
    Ok(conn)
}

/// In-memory DB with the same schema (tests, throwaway runs).
pub fn open_db_in_memory() -> CollectResult<Connection> {
    let conn = Connection::open_in_memory()
        .map_err(|e| CollectError::transient("open in-memory database", e))?;
    conn.execute_batch(SCHEMA)
        .map_err(|e| CollectError::transient("create schema", e))?;
    Ok(conn)
}

/// Stored parts recorded for `run_id`.
pub fn part_count(
    conn: &Connection,
    inventory: &str,
    schema: &str,
    run_id: &str,
) -> CollectResult<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM parts WHERE inventory = ?1 AND schema_name = ?2 AND run_id = ?3",
        (inventory, schema, run_id),
        |row| row.get(0),
    )?;
    Ok(n.max(0) as u64)
}

/// Active references in one collection, sorted.
pub fn active_references(
    conn: &Connection,
    inventory: &str,
    schema: &str,
    collection: &str,
) -> CollectResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT reference FROM entities
         WHERE inventory = ?1 AND schema_name = ?2 AND collection = ?3 AND active = 1
         ORDER BY reference",
    )?;
    let rows = stmt.query_map((inventory, schema, collection), |row| row.get(0))?;
    let mut refs = Vec::new();
    for row in rows {
        refs.push(row?);
    }
    Ok(refs)
}
