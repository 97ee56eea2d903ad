//! Record counter shown in verbose mode while a Run streams.

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

use crate::utils::config::PROGRESS_UPDATE_BATCH_SIZE;

pub type ProgressBar = Arc<Mutex<Bar>>;

/// Counter for unknown total (shows count without percentage)
pub fn create_counter(desc: String) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " records"
    )))
}

/// Force a refresh of the bar (e.g. so the counter shows "0 records" immediately).
pub fn refresh_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.refresh();
    }
}

/// Update progress bar if available. Skips the update if the lock is contended.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Counts records and pushes them to the bar every [`PROGRESS_UPDATE_BATCH_SIZE`].
pub struct RecordProgress {
    bar: Option<ProgressBar>,
    pending: usize,
}

impl RecordProgress {
    /// `None` when not verbose: every call is a no-op.
    pub fn new(verbose: bool, desc: &str) -> Self {
        let bar = verbose.then(|| {
            let b = create_counter(desc.to_string());
            refresh_bar(&b);
            b
        });
        Self { bar, pending: 0 }
    }

    pub fn disabled() -> Self {
        Self {
            bar: None,
            pending: 0,
        }
    }

    pub fn tick(&mut self) {
        let Some(ref bar) = self.bar else {
            return;
        };
        self.pending += 1;
        if self.pending >= PROGRESS_UPDATE_BATCH_SIZE {
            update_progress_bar(bar, self.pending);
            self.pending = 0;
        }
    }

    /// Push the remainder and leave the bar on screen.
    pub fn finish(mut self) {
        if let Some(ref bar) = self.bar {
            if self.pending > 0 {
                update_progress_bar(bar, self.pending);
                self.pending = 0;
            }
            if let Ok(mut b) = bar.lock() {
                let _ = b.refresh();
                eprintln!();
            }
        }
    }
}
