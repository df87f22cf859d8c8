//! Progress reporting hooks for long clustering runs.
//!
//! Observers see every similarity evaluation and every split but cannot
//! influence the result. They must be `Sync` because parallel runs call them
//! from several worker threads.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives progress events from the clusterer.
pub trait ProgressObserver: Sync {
    /// Called after each similarity evaluation against a pivot.
    fn on_similarity(&self, _depth: usize, _completed: usize, _total: usize) {}

    /// Called once per internal node after its input has been partitioned.
    fn on_split(&self, _depth: usize, _left: usize, _right: usize, _forced: bool) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Logs top-level progress through `tracing`.
///
/// Only the root pass is reported, in steps of `step_percent`, since nested
/// passes are short and would flood the log.
#[derive(Debug)]
pub struct LogProgress {
    step_percent: usize,
    last_reported: AtomicUsize,
}

impl LogProgress {
    pub fn new(step_percent: usize) -> Self {
        Self {
            step_percent: step_percent.clamp(1, 100),
            last_reported: AtomicUsize::new(0),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressObserver for LogProgress {
    fn on_similarity(&self, depth: usize, completed: usize, total: usize) {
        if depth > 0 || total == 0 {
            return;
        }
        let percent = completed * 100 / total;
        let bucket = percent / self.step_percent * self.step_percent;
        if bucket > self.last_reported.fetch_max(bucket, Ordering::Relaxed) {
            tracing::info!(completed, total, "pivot scoring {bucket}%");
        }
    }

    fn on_split(&self, depth: usize, left: usize, right: usize, forced: bool) {
        tracing::debug!(depth, left, right, forced, "partitioned node");
    }
}

/// Counts events; handy for tests and run statistics.
#[derive(Debug, Default)]
pub struct CountingProgress {
    similarities: AtomicUsize,
    splits: AtomicUsize,
    forced: AtomicUsize,
}

impl CountingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total similarity evaluations seen.
    pub fn similarities(&self) -> usize {
        self.similarities.load(Ordering::Relaxed)
    }

    /// Internal nodes partitioned.
    pub fn splits(&self) -> usize {
        self.splits.load(Ordering::Relaxed)
    }

    /// Internal nodes that needed the order-based fallback split.
    pub fn forced_splits(&self) -> usize {
        self.forced.load(Ordering::Relaxed)
    }
}

impl ProgressObserver for CountingProgress {
    fn on_similarity(&self, _depth: usize, _completed: usize, _total: usize) {
        self.similarities.fetch_add(1, Ordering::Relaxed);
    }

    fn on_split(&self, _depth: usize, _left: usize, _right: usize, forced: bool) {
        self.splits.fetch_add(1, Ordering::Relaxed);
        if forced {
            self.forced.fetch_add(1, Ordering::Relaxed);
        }
    }
}
