//! Recorder trait - Delivery-side persistence interface

use std::sync::Arc;

use crate::{PipelineError, SyncedFrame};

/// User callback invoked once per delivered frame.
///
/// Runs on the delivery thread with no engine locks held; a slow callback
/// backs up the delivery queue but never stalls synchronization.
pub type SyncedFrameCallback = Arc<dyn Fn(&SyncedFrame) + Send + Sync>;

/// Synced-frame persistence trait
///
/// Called synchronously on the delivery thread, before the user callback.
/// A failing `record` is logged and skipped; it must not poison later
/// frames.
pub trait Recorder: Send + Sync {
    /// Recorder name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Whether the recorder is currently accepting frames
    fn is_active(&self) -> bool;

    /// Persist one synced frame
    ///
    /// # Errors
    /// Returns a recording error (should include context)
    fn record(&self, frame: &SyncedFrame) -> Result<(), PipelineError>;

    /// Flush and deactivate. Idempotent.
    fn stop(&self);
}
