//! Upload side: the store trait, the SQLite inventory store, and the dry-run store.

mod connection;
mod inventory;

pub use connection::{active_references, open_db, open_db_in_memory, part_count};
pub use inventory::SqliteStore;

use log::info;

use super::allocator::{PartId, RunId};
use crate::error::CollectResult;
use crate::{Collections, SweepScope};

/// Downstream inventory store. Both calls may fail with transport errors.
pub trait InventoryStore {
    /// Write one part. Returns how many parts the store actually wrote (it may split).
    fn save_inventory(
        &mut self,
        collections: &Collections,
        inventory: &str,
        schema: &str,
        run_id: &RunId,
        part_id: &PartId,
    ) -> CollectResult<u64>;

    /// Deactivate every record in `sweep_scope` not refreshed by parts 1..=`total_parts` of `run_id`.
    fn sweep_inventory(
        &mut self,
        inventory: &str,
        schema: &str,
        run_id: &RunId,
        total_parts: u64,
        sweep_scope: &SweepScope,
    ) -> CollectResult<()>;
}

/// Logs parts and sweeps; writes nothing. Reports one part per save.
#[derive(Debug, Default)]
pub struct DryRunStore;

impl InventoryStore for DryRunStore {
    fn save_inventory(
        &mut self,
        collections: &Collections,
        inventory: &str,
        _schema: &str,
        run_id: &RunId,
        part_id: &PartId,
    ) -> CollectResult<u64> {
        let summary: Vec<String> = collections
            .iter()
            .map(|(name, items)| format!("{}={}", name, items.len()))
            .collect();
        info!(
            "[dry-run] {inventory} run {run_id} part {part_id}: {}",
            summary.join(" ")
        );
        Ok(1)
    }

    fn sweep_inventory(
        &mut self,
        inventory: &str,
        _schema: &str,
        run_id: &RunId,
        total_parts: u64,
        sweep_scope: &SweepScope,
    ) -> CollectResult<()> {
        let names: Vec<&str> = sweep_scope.iter().map(String::as_str).collect();
        info!(
            "[dry-run] {inventory} run {run_id} sweep after {total_parts} part(s): {}",
            names.join(", ")
        );
        Ok(())
    }
}
