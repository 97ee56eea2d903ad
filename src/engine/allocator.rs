//! Run/part allocation and the per-Run accumulator.

use log::debug;
use std::fmt;
use uuid::Uuid;

use super::batcher::Batcher;
use super::db_ops::InventoryStore;
use crate::error::CollectResult;
use crate::{InventoryTarget, SweepScope};

/// Opaque identifier of one Run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

/// Opaque identifier of one flushed part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PartId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl PartId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for PartId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything one Run accumulates: its id, parts written so far, and the collections touched.
///
/// Lives only for the Run's processing window. Sweeping consumes it, so no part can be
/// written under the same RunId afterwards.
#[derive(Debug)]
pub struct RunLedger {
    run_id: RunId,
    total_parts: u64,
    flushes: u64,
    records: u64,
    sweep_scope: SweepScope,
}

/// Start a Run with a fresh RunId.
pub fn begin_run() -> RunLedger {
    RunLedger {
        run_id: RunId::new(),
        total_parts: 0,
        flushes: 0,
        records: 0,
        sweep_scope: SweepScope::new(),
    }
}

impl RunLedger {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Sum of parts the store reported across all flushes.
    pub fn total_parts(&self) -> u64 {
        self.total_parts
    }

    /// Flushes that reached the store.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// Raw records consumed across all flushes.
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn sweep_scope(&self) -> &SweepScope {
        &self.sweep_scope
    }

    /// Hand the batch to the store as one part and return an empty batcher.
    ///
    /// The part count reported by the store is authoritative (it may split further).
    /// An empty batch writes nothing.
    pub fn flush(
        &mut self,
        batch: Batcher,
        store: &mut dyn InventoryStore,
        target: &InventoryTarget,
    ) -> CollectResult<Batcher> {
        self.records += batch.size() as u64;
        if batch.is_empty() {
            return Ok(batch.reset());
        }

        let part_id = PartId::new();
        let touched: Vec<String> = batch.touched().map(str::to_string).collect();
        let entities = batch.entity_count();
        let collections = batch.into_collections();

        let parts = store.save_inventory(
            &collections,
            &target.inventory,
            &target.schema,
            &self.run_id,
            &part_id,
        )?;

        self.flushes += 1;
        self.total_parts += parts;
        self.sweep_scope.extend(touched);
        debug!(
            "run {} part {} (#{}): {} entities, store wrote {} part(s), {} total",
            self.run_id, part_id, self.flushes, entities, parts, self.total_parts
        );
        Ok(Batcher::new())
    }

    pub(crate) fn into_parts(self) -> (RunId, u64, SweepScope) {
        (self.run_id, self.total_parts, self.sweep_scope)
    }
}
