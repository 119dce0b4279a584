use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by the log worker.
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    /// Lines written to disk, session headers included
    pub lines_written: AtomicU64,
    /// Writer flush+close operations
    pub flush_count: AtomicU64,
    /// Append tasks that failed with an I/O error
    pub write_failures: AtomicU64,
    /// Tasks refused because the worker had stopped
    pub dropped_tasks: AtomicU64,
}

/// Snapshot of [`WorkerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub lines_written: u64,
    pub flush_count: u64,
    pub write_failures: u64,
    pub dropped_tasks: u64,
}

impl WorkerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_line(&self) {
        self.lines_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush(&self) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped_tasks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            lines_written: self.lines_written.load(Ordering::Relaxed),
            flush_count: self.flush_count.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            dropped_tasks: self.dropped_tasks.load(Ordering::Relaxed),
        }
    }
}
