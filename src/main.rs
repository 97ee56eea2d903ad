//! invsweep CLI: collect inventory on an interval; use --once for a single cycle.

use anyhow::Result;
use clap::Parser;
use invsweep::engine::arg_parser::Cli;
use invsweep::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
