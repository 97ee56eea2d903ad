//! Poll scheduler: repeated cycles, failure containment, stop handling.

use crossbeam_channel::{Receiver, Sender, bounded};
use log::{debug, warn};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::engine::db_ops::InventoryStore;
use crate::engine::progress::RecordProgress;
use crate::engine::{EntityPlan, Registry, enumerate_scopes, validate_accounts};
use crate::error::{CollectResult, ErrorKind};
use crate::pipeline::{
    CycleContext, CycleOutcome, CycleReport, Disposition, record_cycle_outcome, run_entity_type,
};
use crate::source::Discovery;
use crate::utils::Metrics;
use crate::Opts;

/// External stop flag. Cloned into the Ctrl+C handler; wakes a sleeping scheduler.
#[derive(Clone, Debug)]
pub struct StopSignal {
    finished: Arc<AtomicBool>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            finished: Arc::new(AtomicBool::new(false)),
            wake_tx,
            wake_rx,
        }
    }

    pub fn stop(&self) {
        self.finished.store(true, Ordering::SeqCst);
        let _ = self.wake_tx.try_send(());
    }

    pub fn is_stopped(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Sleep up to `timeout`, returning early on [`stop`](Self::stop). True if stopped.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        let _ = self.wake_rx.recv_timeout(timeout);
        self.is_stopped()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Sleeping,
    Stopped,
}

pub struct Scheduler {
    opts: Opts,
    plans: Vec<EntityPlan>,
    discovery: Rc<dyn Discovery>,
    store: Box<dyn InventoryStore>,
    metrics: Arc<Metrics>,
    stop: StopSignal,
    state: SchedulerState,
}

impl Scheduler {
    /// Resolve `opts.entity_types` against `registry`. Configuration errors surface here.
    pub fn new(
        opts: Opts,
        registry: &Registry,
        discovery: Rc<dyn Discovery>,
        store: Box<dyn InventoryStore>,
    ) -> CollectResult<Self> {
        let plans = registry.resolve(&opts.entity_types)?;
        Ok(Self {
            opts,
            plans,
            discovery,
            store,
            metrics: Arc::new(Metrics::default()),
            stop: StopSignal::new(),
            state: SchedulerState::Idle,
        })
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn plans(&self) -> &[EntityPlan] {
        &self.plans
    }

    fn transition(&mut self, next: SchedulerState) {
        if self.state != next {
            debug!("scheduler: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Refresh regions and accounts, validate accounts, enumerate scopes.
    pub fn prepare_cycle(&self) -> CollectResult<CycleContext> {
        let regions = self.discovery.list_regions()?;
        let candidates = self.discovery.list_accounts()?;
        let candidate_count = candidates.len();
        let role_template = self.opts.role_template.as_deref();

        let reference = self
            .opts
            .reference_region
            .as_deref()
            .or(regions.first().map(String::as_str));
        let accounts = match reference {
            Some(region) => {
                validate_accounts(self.discovery.as_ref(), region, candidates, role_template)
            }
            None => {
                warn!("No regions discovered; nothing to collect this cycle");
                Vec::new()
            }
        };
        let scopes = enumerate_scopes(&accounts, &regions, role_template);
        Ok(CycleContext {
            regions,
            candidates: candidate_count,
            accounts,
            scopes,
        })
    }

    fn collect(&mut self, report: &mut CycleReport) -> CollectResult<()> {
        let ctx = self.prepare_cycle()?;
        report.accounts_candidate = ctx.candidates;
        report.accounts_valid = ctx.accounts.len();
        report.scopes = ctx.scopes.len();

        let target = self.opts.target();
        let mut first_error = None;
        for plan in &self.plans {
            let mut progress = RecordProgress::new(self.opts.verbose, plan.name());
            let result = run_entity_type(
                plan,
                &ctx.scopes,
                self.store.as_mut(),
                &target,
                &mut progress,
            );
            progress.finish();
            match result {
                Ok(summary) => report.runs.push(summary),
                Err(e) => {
                    report.failed_types.push(plan.name().to_string());
                    if !self.opts.isolate_failures || e.kind() == ErrorKind::Config {
                        return Err(e);
                    }
                    warn!("{}: run abandoned, not swept: {}", plan.name(), e);
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// One full pass over every top-level entity type. Never panics on collection errors.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let mut report = CycleReport::default();
        match self.collect(&mut report) {
            Ok(()) => CycleOutcome::Completed(report),
            Err(error) => CycleOutcome::Failed { error, report },
        }
    }

    /// Loop cycles until stopped. Single-shot stops itself after one cycle.
    ///
    /// Returns an error only for configuration failures; everything else is logged,
    /// metered, and retried next cycle.
    pub fn run(&mut self) -> CollectResult<()> {
        loop {
            if self.stop.is_stopped() {
                break;
            }
            self.transition(SchedulerState::Running);
            let outcome = self.run_cycle();
            let disposition = record_cycle_outcome(&outcome, &self.metrics);
            if disposition == Disposition::Fatal
                && let CycleOutcome::Failed { error, .. } = outcome
            {
                self.stop.stop();
                self.transition(SchedulerState::Stopped);
                return Err(error);
            }
            if self.opts.single_shot {
                self.stop.stop();
                break;
            }
            self.transition(SchedulerState::Sleeping);
            if self.stop.wait(self.opts.poll_interval) {
                break;
            }
        }
        self.transition(SchedulerState::Stopped);
        Ok(())
    }
}
