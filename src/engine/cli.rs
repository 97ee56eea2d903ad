//! CLI command handler: build options, wire collaborators, run the scheduler.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::engine::db_ops::{DryRunStore, InventoryStore, SqliteStore};
use crate::engine::registry::{EntityHandler, Registry};
use crate::pipeline::Scheduler;
use crate::source::{FileSource, RuleParser};
use crate::utils::config::PackagePaths;
use crate::utils::{apply_file_to_opts, load_invsweep_toml, setup_logging};

/// Defaults, then the config file, then CLI flags.
fn setup_opts(cli: &Cli) -> Result<Opts> {
    let mut opts = Opts::default();
    let path = cli.config_path();
    match load_invsweep_toml(&path)? {
        Some(file) => apply_file_to_opts(file, &mut opts),
        None if cli.config.is_some() => bail!("config file {} not found", path.display()),
        None => {}
    }

    if let Some(ref s) = cli.source {
        opts.source_dir = Some(s.clone());
    }
    if let Some(ref d) = cli.db {
        opts.db_path = Some(d.clone());
    }
    if let Some(ref name) = cli.inventory {
        opts.inventory_name = name.clone();
    }
    if let Some(ref name) = cli.schema {
        opts.schema_name = name.clone();
    }
    if let Some(once) = cli.once {
        opts.single_shot = once;
    }
    if let Some(secs) = cli.interval {
        opts.poll_interval = Duration::from_secs(secs);
    }
    if let Some(v) = cli.dry_run {
        opts.dry_run = v;
    }
    if let Some(v) = cli.isolate_failures {
        opts.isolate_failures = v;
    }
    if cli.role_template.is_some() {
        opts.role_template = cli.role_template.clone();
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    Ok(opts)
}

fn open_store(opts: &Opts) -> Result<Box<dyn InventoryStore>> {
    if opts.dry_run {
        warn!("RUNNING IN DRY-RUN MODE. NOTHING WILL BE WRITTEN OR SWEPT.");
        return Ok(Box::new(DryRunStore));
    }
    let db_path = opts
        .db_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(PackagePaths::get().db_filename()));
    let store = SqliteStore::open(&db_path, opts.max_part_rows)
        .with_context(|| format!("open inventory database {}", db_path.display()))?;
    Ok(Box::new(store))
}

/// Run continuously (default) or once with `--once`.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let _ = dotenvy::dotenv();
    let opts = setup_opts(cli)?;
    setup_logging(opts.verbose);
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        opts
    );

    let source_dir = opts
        .source_dir
        .clone()
        .context("no source directory: pass --source or set settings.source_dir")?;
    let source = Rc::new(FileSource::new(source_dir));
    let registry =
        Registry::new().with_fallback(EntityHandler::new(source.clone(), Rc::new(RuleParser)));
    let store = open_store(&opts)?;

    let mut scheduler = Scheduler::new(opts, &registry, source, store)?;
    let stop = scheduler.stop_signal();
    ctrlc::set_handler(move || stop.stop()).context("set Ctrl+C handler")?;

    scheduler.run()?;

    let m = scheduler.metrics().snapshot();
    info!(
        "Stopped: {} cycle(s) ok, {} failed, {} part(s), {} sweep(s)",
        m.cycles_completed, m.cycles_failed, m.parts_written, m.sweeps_issued
    );
    Ok(())
}
