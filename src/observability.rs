//! Storage operation counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle shared by every storage built from the same settings
#[derive(Debug, Default)]
pub struct Metrics {
    items_read: AtomicU64,
    items_written: AtomicU64,
    items_removed: AtomicU64,
    index_writes: AtomicU64,
    corrupt_index: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_read(&self) {
        self.items_read.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "items_read", "Metric incremented");
    }

    pub fn item_written(&self) {
        self.items_written.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "items_written", "Metric incremented");
    }

    pub fn item_removed(&self) {
        self.items_removed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "items_removed", "Metric incremented");
    }

    pub fn index_written(&self) {
        self.index_writes.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "index_writes", "Metric incremented");
    }

    pub fn corrupt_index(&self) {
        self.corrupt_index.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "corrupt_index", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_read: self.items_read.load(Ordering::Relaxed),
            items_written: self.items_written.load(Ordering::Relaxed),
            items_removed: self.items_removed.load(Ordering::Relaxed),
            index_writes: self.index_writes.load(Ordering::Relaxed),
            corrupt_index: self.corrupt_index.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub items_read: u64,
    pub items_written: u64,
    pub items_removed: u64,
    pub index_writes: u64,
    pub corrupt_index: u64,
}
