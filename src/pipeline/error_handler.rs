use log::{error, info, warn};

use crate::engine::SweepOutcome;
use crate::error::{CollectError, ErrorKind};
use crate::pipeline::CycleReport;
use crate::utils::Metrics;

/// Result of one cycle, returned to the scheduler instead of unwinding.
#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Failed {
        error: CollectError,
        report: CycleReport,
    },
}

impl CycleOutcome {
    pub fn report(&self) -> &CycleReport {
        match self {
            Self::Completed(report) | Self::Failed { report, .. } => report,
        }
    }

    pub fn error(&self) -> Option<&CollectError> {
        match self {
            Self::Completed(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// What the scheduler does after a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Sleep (or exit in single-shot) and carry on.
    Continue,
    /// Configuration is broken; retrying cannot help.
    Fatal,
}

/// Log the outcome, update metrics, and decide whether the scheduler may continue.
pub fn record_cycle_outcome(outcome: &CycleOutcome, metrics: &Metrics) -> Disposition {
    let report = outcome.report();
    metrics.parts_written(report.parts_written());
    for run in &report.runs {
        match run.sweep {
            SweepOutcome::Swept { .. } => metrics.sweep_issued(),
            SweepOutcome::Skipped { .. } => metrics.sweep_skipped(),
        }
    }

    match outcome {
        CycleOutcome::Completed(report) => {
            metrics.cycle_completed();
            info!(
                "Cycle complete: {} scope(s), {} run(s), {} part(s), {} sweep(s)",
                report.scopes,
                report.runs.len(),
                report.parts_written(),
                report.sweeps()
            );
            Disposition::Continue
        }
        CycleOutcome::Failed { error: e, report } => {
            metrics.cycle_failed();
            let done = report.runs.len();
            match e.kind() {
                ErrorKind::Access => {
                    warn!("Cycle abandoned after {} run(s): {}", done, e);
                    Disposition::Continue
                }
                ErrorKind::Transient => {
                    error!("Cycle failed after {} run(s): {}", done, error_chain(e));
                    Disposition::Continue
                }
                ErrorKind::Config => {
                    error!("Cycle failed on configuration: {}", e);
                    Disposition::Fatal
                }
            }
        }
    }
}

/// Error message followed by its sources, `: `-joined.
fn error_chain(e: &CollectError) -> String {
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}
