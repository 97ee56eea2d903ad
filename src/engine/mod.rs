//! Engine module for batching, run/part allocation, sweeping, and scope handling

pub mod allocator;
pub mod arg_parser;
pub mod batcher;
pub mod cli;
pub mod db_ops;
pub mod progress;
pub mod registry;
pub mod scope;
pub mod sweep;
pub mod validator;

// Re-export commonly used functions
pub use allocator::{PartId, RunId, RunLedger, begin_run};
pub use arg_parser::Cli;
pub use batcher::Batcher;
pub use cli::handle_run;
pub use db_ops::{DryRunStore, InventoryStore, SqliteStore, open_db, open_db_in_memory};
pub use registry::{EntityHandler, EntityPlan, Registry, ResolvedType};
pub use scope::enumerate_scopes;
pub use sweep::{SweepOutcome, sweep_run};
pub use validator::{valid_account, validate_accounts};
