//! Sweep coordinator: closes a Run by retiring what it did not refresh.

use log::{debug, info};

use super::allocator::{RunId, RunLedger};
use super::db_ops::InventoryStore;
use crate::error::CollectResult;
use crate::{InventoryTarget, SweepScope};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The store was asked to deactivate stale records.
    Swept {
        run_id: RunId,
        total_parts: u64,
        scope: SweepScope,
    },
    /// The Run wrote no parts; there is nothing to reconcile.
    Skipped { run_id: RunId },
}

impl SweepOutcome {
    pub fn was_swept(&self) -> bool {
        matches!(self, Self::Swept { .. })
    }
}

/// Issue the final sweep for a Run. Must be called once every scope has been visited.
///
/// Consumes the ledger: the sweep is the last operation under its RunId.
pub fn sweep_run(
    ledger: RunLedger,
    store: &mut dyn InventoryStore,
    target: &InventoryTarget,
) -> CollectResult<SweepOutcome> {
    let (run_id, total_parts, scope) = ledger.into_parts();
    if total_parts == 0 {
        debug!("run {run_id}: no parts written, sweep skipped");
        return Ok(SweepOutcome::Skipped { run_id });
    }

    store.sweep_inventory(
        &target.inventory,
        &target.schema,
        &run_id,
        total_parts,
        &scope,
    )?;
    info!(
        "run {run_id}: swept {} collection(s) after {total_parts} part(s)",
        scope.len()
    );
    Ok(SweepOutcome::Swept {
        run_id,
        total_parts,
        scope,
    })
}
