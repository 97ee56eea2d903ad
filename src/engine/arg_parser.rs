use clap::Parser;
use std::path::PathBuf;

use crate::utils::config::PackagePaths;

/// Incremental inventory collector with run/part uploads and sweeps.
#[derive(Clone, Parser)]
#[command(name = "invsweep")]
#[command(about = "Collect inventory in bounded parts and sweep what was not refreshed; use --once for a single cycle.")]
pub struct Cli {
    /// Config file. Default: `$INVSWEEP_CONFIG`, else `.invsweep.toml` in the current directory.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Root directory of the file-backed source (accounts.json, regions.json, records).
    #[arg(long, short)]
    pub source: Option<PathBuf>,

    /// Path to the inventory database. Default: `invsweep.db` in the current directory.
    #[arg(long, short)]
    pub db: Option<PathBuf>,

    /// Inventory name parts and sweeps are addressed to.
    #[arg(long)]
    pub inventory: Option<String>,

    /// Schema name within the inventory.
    #[arg(long)]
    pub schema: Option<String>,

    /// Run a single cycle and exit.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub once: Option<bool>,

    /// Seconds between cycles in continuous mode.
    #[arg(long, short = 'i', value_parser = clap::value_parser!(u64))]
    pub interval: Option<u64>,

    /// Log parts and sweeps instead of writing them.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub dry_run: Option<bool>,

    /// Keep collecting later entity types when one fails (the failed one is not swept).
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub isolate_failures: Option<bool>,

    /// Role to assume for non-master accounts; `{account}` is replaced by the account id.
    #[arg(long)]
    pub role_template: Option<String>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}

impl Cli {
    /// Config path: `--config`, then the package env var, then the default filename.
    pub fn config_path(&self) -> PathBuf {
        let paths = PackagePaths::get();
        self.config
            .clone()
            .or_else(|| std::env::var_os(paths.config_env_var()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(paths.config_filename()))
    }
}
