use log::{debug, info};

use crate::engine::db_ops::InventoryStore;
use crate::engine::progress::RecordProgress;
use crate::engine::{Batcher, EntityPlan, begin_run, sweep_run};
use crate::error::CollectResult;
use crate::pipeline::RunSummary;
use crate::{InventoryTarget, Scope};

/// One Run: every scope × (primary + related types) → bounded parts → sweep.
///
/// Any error returns immediately. Parts already flushed stay in the store and the Run is
/// not swept; the next Run gets a new RunId.
pub fn run_entity_type(
    plan: &EntityPlan,
    scopes: &[Scope],
    store: &mut dyn InventoryStore,
    target: &InventoryTarget,
    progress: &mut RecordProgress,
) -> CollectResult<RunSummary> {
    let mut ledger = begin_run();
    let mut batch = Batcher::new();
    info!(
        "{}: run {} over {} scope(s)",
        plan.name(),
        ledger.run_id(),
        scopes.len()
    );

    for scope in scopes {
        for member in plan.members() {
            let entity_type = &member.entity_type;
            let handler = &member.handler;
            debug!(
                "{}: collecting {} in {}/{}",
                plan.name(),
                entity_type.name,
                scope.account_id(),
                scope.region()
            );
            handler
                .source
                .for_each_record(entity_type, scope, &mut |record| {
                    handler
                        .parser
                        .parse(entity_type, &record, scope, &mut batch)?;
                    batch.record_primary();
                    progress.tick();
                    if batch.size() >= entity_type.limit {
                        let full = std::mem::take(&mut batch);
                        batch = ledger.flush(full, store, target)?;
                    }
                    Ok(())
                })?;
        }
    }

    // Residual entities from the last window.
    let rest = std::mem::take(&mut batch);
    ledger.flush(rest, store, target)?;

    let run_id = ledger.run_id();
    let records = ledger.records();
    let flushes = ledger.flushes();
    let total_parts = ledger.total_parts();
    let sweep = sweep_run(ledger, store, target)?;

    info!(
        "{}: run {} done, {} record(s), {} part(s)",
        plan.name(),
        run_id,
        records,
        total_parts
    );
    Ok(RunSummary {
        entity_type: plan.name().to_string(),
        run_id,
        records,
        flushes,
        total_parts,
        sweep,
    })
}
