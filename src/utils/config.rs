//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    db_filename: String,
    config_filename: String,
    config_env_var: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                db_filename: format!("{pkg}.db"),
                config_filename: format!(".{pkg}.toml"),
                config_env_var: format!("{}_CONFIG", pkg.to_uppercase()),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    pub fn db_filename(&self) -> &str {
        &self.db_filename
    }

    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Env var that may point at the config file (also read from `.env`).
    pub fn config_env_var(&self) -> &str {
        &self.config_env_var
    }
}

// ---- Batching ----

/// Raw records per part when an entity type sets no limit.
pub const DEFAULT_BATCH_LIMIT: usize = 1000;

/// Rows per stored part in the SQLite store; larger payloads are split.
pub const MAX_PART_ROWS: usize = 5000;

// ---- Scheduling ----

/// Seconds between cycles in continuous mode.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

// ---- Progress ----

/// Progress counter update batch (records) to keep the bar lock quiet.
pub const PROGRESS_UPDATE_BATCH_SIZE: usize = 100;
