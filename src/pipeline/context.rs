//! Per-cycle inputs and per-Run / per-cycle results.

use crate::engine::{RunId, SweepOutcome};
use crate::{Account, Scope};

/// Resolved inputs for one cycle: discovered regions, validated accounts, and their scopes.
#[derive(Clone, Debug, Default)]
pub struct CycleContext {
    pub regions: Vec<String>,
    /// Accounts listed before validation.
    pub candidates: usize,
    pub accounts: Vec<Account>,
    pub scopes: Vec<Scope>,
}

/// What one finished Run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub entity_type: String,
    pub run_id: RunId,
    pub records: u64,
    pub flushes: u64,
    pub total_parts: u64,
    pub sweep: SweepOutcome,
}

/// Everything a cycle got done before it completed or was abandoned.
#[derive(Clone, Debug, Default)]
pub struct CycleReport {
    pub accounts_candidate: usize,
    pub accounts_valid: usize,
    pub scopes: usize,
    pub runs: Vec<RunSummary>,
    /// Entity types whose Run failed (only more than one with isolated failures).
    pub failed_types: Vec<String>,
}

impl CycleReport {
    pub fn parts_written(&self) -> u64 {
        self.runs.iter().map(|r| r.total_parts).sum()
    }

    pub fn sweeps(&self) -> usize {
        self.runs.iter().filter(|r| r.sweep.was_swept()).count()
    }
}
