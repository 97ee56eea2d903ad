//! Process-wide counters. Shared via `Arc`; safe to read from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    cycles_completed: AtomicU64,
    cycles_failed: AtomicU64,
    parts_written: AtomicU64,
    sweeps_issued: AtomicU64,
    sweeps_skipped: AtomicU64,
}

/// Plain copy of [`Metrics`] at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub parts_written: u64,
    pub sweeps_issued: u64,
    pub sweeps_skipped: u64,
}

impl Metrics {
    pub fn cycle_completed(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// One increment per failed cycle, regardless of how many Runs failed inside it.
    pub fn cycle_failed(&self) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn parts_written(&self, n: u64) {
        self.parts_written.fetch_add(n, Ordering::Relaxed);
    }

    pub fn sweep_issued(&self) {
        self.sweeps_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sweep_skipped(&self) {
        self.sweeps_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            parts_written: self.parts_written.load(Ordering::Relaxed),
            sweeps_issued: self.sweeps_issued.load(Ordering::Relaxed),
            sweeps_skipped: self.sweeps_skipped.load(Ordering::Relaxed),
        }
    }
}
