pub mod config;
pub mod invsweep_toml;
pub mod logger;
pub mod metrics;

pub use config::*;
pub use invsweep_toml::{apply_file_to_opts, load_invsweep_toml, parse_invsweep_toml};
pub use logger::setup_logging;
pub use metrics::{Metrics, MetricsSnapshot};
