//! SQLite-backed inventory store: upsert parts, sweep by RunId.

use log::debug;
use rusqlite::{Connection, Statement};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::InventoryStore;
use super::connection::{open_db, open_db_in_memory, part_count};
use crate::engine::allocator::{PartId, RunId};
use crate::error::{CollectError, CollectResult};
use crate::{Collections, Entity, SweepScope};

const UPSERT_ENTITY_SQL: &str = r#"
INSERT INTO entities (inventory, schema_name, collection, reference, data, active, last_run, last_part, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8)
ON CONFLICT (inventory, schema_name, collection, reference) DO UPDATE SET
    data = excluded.data,
    active = 1,
    last_run = excluded.last_run,
    last_part = excluded.last_part,
    updated_at = excluded.updated_at
"#;

const INSERT_PART_SQL: &str = "INSERT INTO parts (inventory, schema_name, run_id, part_id, ordinal, rows, written_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const DEACTIVATE_SQL: &str = "UPDATE entities SET active = 0, updated_at = ?5
     WHERE inventory = ?1 AND schema_name = ?2 AND collection = ?3 AND active = 1 AND last_run != ?4";

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub struct SqliteStore {
    conn: Connection,
    max_part_rows: usize,
}

impl SqliteStore {
    pub fn open(path: &Path, max_part_rows: usize) -> CollectResult<Self> {
        Ok(Self::from_connection(open_db(path)?, max_part_rows))
    }

    pub fn in_memory(max_part_rows: usize) -> CollectResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?, max_part_rows))
    }

    /// `max_part_rows` of 0 is treated as 1.
    pub fn from_connection(conn: Connection, max_part_rows: usize) -> Self {
        Self {
            conn,
            max_part_rows: max_part_rows.max(1),
        }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

struct PartKeys<'a> {
    inventory: &'a str,
    schema: &'a str,
    run_id: &'a str,
    part_id: &'a str,
    now: i64,
}

fn execute_upsert(
    stmt: &mut Statement<'_>,
    keys: &PartKeys<'_>,
    collection: &str,
    entity: &Entity,
) -> CollectResult<()> {
    let data = serde_json::to_string(&entity.data)?;
    stmt.execute((
        keys.inventory,
        keys.schema,
        collection,
        entity.reference.as_str(),
        data,
        keys.run_id,
        keys.part_id,
        keys.now,
    ))
    .map_err(|e| CollectError::transient("upsert entity", e))?;
    Ok(())
}

impl InventoryStore for SqliteStore {
    fn save_inventory(
        &mut self,
        collections: &Collections,
        inventory: &str,
        schema: &str,
        run_id: &RunId,
        part_id: &PartId,
    ) -> CollectResult<u64> {
        let run_id = run_id.to_string();
        let part_id = part_id.to_string();
        let keys = PartKeys {
            inventory,
            schema,
            run_id: &run_id,
            part_id: &part_id,
            now: now_secs(),
        };

        let rows: Vec<(&str, &Entity)> = collections
            .iter()
            .flat_map(|(name, items)| items.iter().map(move |e| (name.as_str(), e)))
            .collect();
        if rows.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut written = 0_u64;
        {
            let mut upsert = tx.prepare(UPSERT_ENTITY_SQL)?;
            let mut insert_part = tx.prepare(INSERT_PART_SQL)?;
            for (ordinal, chunk) in rows.chunks(self.max_part_rows).enumerate() {
                for (collection, entity) in chunk {
                    execute_upsert(&mut upsert, &keys, collection, entity)?;
                }
                insert_part.execute((
                    inventory,
                    schema,
                    keys.run_id,
                    keys.part_id,
                    ordinal as i64,
                    chunk.len() as i64,
                    keys.now,
                ))?;
                written += 1;
            }
        }
        tx.commit()?;
        debug!(
            "stored part {} of run {}: {} rows as {} stored part(s)",
            part_id,
            run_id,
            rows.len(),
            written
        );
        Ok(written)
    }

    fn sweep_inventory(
        &mut self,
        inventory: &str,
        schema: &str,
        run_id: &RunId,
        total_parts: u64,
        sweep_scope: &SweepScope,
    ) -> CollectResult<()> {
        let run_id = run_id.to_string();
        let recorded = part_count(&self.conn, inventory, schema, &run_id)?;
        if recorded != total_parts {
            return Err(CollectError::Remote(format!(
                "sweep of run {run_id} declares {total_parts} part(s) but {recorded} were stored"
            )));
        }

        let now = now_secs();
        let tx = self.conn.transaction()?;
        let mut deactivated = 0_usize;
        {
            let mut stmt = tx.prepare(DEACTIVATE_SQL)?;
            for collection in sweep_scope {
                deactivated +=
                    stmt.execute((inventory, schema, collection.as_str(), run_id.as_str(), now))?;
            }
        }
        tx.commit()?;
        debug!("sweep of run {run_id}: {deactivated} record(s) deactivated");
        Ok(())
    }
}
