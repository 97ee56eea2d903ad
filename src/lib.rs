//! Invsweep: incremental inventory collection with run/part uploads and sweeps

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use error::{CollectError, CollectResult, ErrorKind};

use log::debug;
use std::rc::Rc;

use engine::{InventoryStore, Registry};
use pipeline::{CycleOutcome, Scheduler, record_cycle_outcome};
use source::Discovery;

/// Result alias used by the CLI layer
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point for one-off use: resolve `opts.entity_types` against `registry`, run one
/// cycle against `store`, and return its outcome.
///
/// Configuration errors (missing handlers, bad limits) are returned as `Err`; collection
/// failures come back as [`CycleOutcome::Failed`] with whatever the cycle finished.
pub fn run_single_cycle(
    opts: &Opts,
    registry: &Registry,
    discovery: Rc<dyn Discovery>,
    store: Box<dyn InventoryStore>,
) -> CollectResult<CycleOutcome> {
    let opts = Opts {
        single_shot: true,
        ..opts.clone()
    };
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        opts
    );
    let mut scheduler = Scheduler::new(opts, registry, discovery, store)?;
    let outcome = scheduler.run_cycle();
    record_cycle_outcome(&outcome, &scheduler.metrics());
    Ok(outcome)
}
