//! Counters for a worker thread

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for a [`WorkerThread`](super::WorkerThread)
///
/// Counters survive restarts; they describe the instance, not one OS thread.
#[derive(Debug, Default)]
pub struct WorkerThreadStats {
    /// Items whose callback returned normally
    pub items_processed: AtomicU64,
    /// Items whose callback panicked
    pub items_panicked: AtomicU64,
    /// Items dropped because no callback was registered
    pub items_skipped: AtomicU64,
    /// OS threads spawned over the instance's lifetime
    pub threads_spawned: AtomicU64,
    /// Total time spent inside the callback (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerThreadStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment_processed(&self) {
        self.items_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_panicked(&self) {
        self.items_panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_skipped(&self) {
        self.items_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_spawned(&self) {
        self.threads_spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total items processed
    pub fn get_items_processed(&self) -> u64 {
        self.items_processed.load(Ordering::Relaxed)
    }

    /// Get total items whose callback panicked
    pub fn get_items_panicked(&self) -> u64 {
        self.items_panicked.load(Ordering::Relaxed)
    }

    /// Get total items dropped for lack of a callback
    pub fn get_items_skipped(&self) -> u64 {
        self.items_skipped.load(Ordering::Relaxed)
    }

    /// Get number of OS threads spawned so far
    pub fn get_threads_spawned(&self) -> u64 {
        self.threads_spawned.load(Ordering::Relaxed)
    }

    /// Get average callback time per processed item in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.items_processed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}
