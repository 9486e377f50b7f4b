//! Ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Frames captured from the frame source
    pub frames_captured: AtomicU64,

    /// Event batches received from the event source
    pub event_batches: AtomicU64,

    /// Total events received
    pub events: AtomicU64,

    /// Trigger pulses received
    pub triggers: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one captured frame
    pub fn record_frame(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one event batch
    pub fn record_event_batch(&self, len: usize) {
        self.event_batches.fetch_add(1, Ordering::Relaxed);
        self.events.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Record one trigger pulse
    pub fn record_trigger(&self) {
        self.triggers.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            event_batches: self.event_batches.load(Ordering::Relaxed),
            events: self.events.load(Ordering::Relaxed),
            triggers: self.triggers.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    /// Frames captured from the frame source
    pub frames_captured: u64,

    /// Event batches received
    pub event_batches: u64,

    /// Total events received
    pub events: u64,

    /// Trigger pulses received
    pub triggers: u64,
}
