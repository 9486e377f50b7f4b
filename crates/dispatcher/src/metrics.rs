//! Delivery metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the delivery worker
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    /// Frames delivered to the callback
    delivered: AtomicU64,
    /// Recorder failures (logged, never retried)
    record_failures: AtomicU64,
    /// Callback panics caught
    callback_panics: AtomicU64,
    /// Frames discarded undelivered at shutdown
    discarded: AtomicU64,
}

impl DeliveryMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failures(&self) -> u64 {
        self.record_failures.load(Ordering::Relaxed)
    }

    pub fn inc_record_failures(&self) {
        self.record_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn callback_panics(&self) -> u64 {
        self.callback_panics.load(Ordering::Relaxed)
    }

    pub fn inc_callback_panics(&self) {
        self.callback_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    pub fn add_discarded(&self, n: u64) {
        self.discarded.fetch_add(n, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> DeliverySnapshot {
        DeliverySnapshot {
            delivered: self.delivered(),
            record_failures: self.record_failures(),
            callback_panics: self.callback_panics(),
            discarded: self.discarded(),
        }
    }
}

/// Snapshot of delivery metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct DeliverySnapshot {
    pub delivered: u64,
    pub record_failures: u64,
    pub callback_panics: u64,
    pub discarded: u64,
}
