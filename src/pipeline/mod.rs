//! Pipeline components: cycle context, per-Run orchestration, outcome handling, scheduler.

pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod scheduler;

pub use context::{CycleContext, CycleReport, RunSummary};
pub use error_handler::{CycleOutcome, Disposition, record_cycle_outcome};
pub use orchestrator::run_entity_type;
pub use scheduler::{Scheduler, SchedulerState, StopSignal};
