//! FrameSource / EventSource traits - Camera abstraction
//!
//! Defines unified interfaces for the two camera roles, decoupling the
//! pipeline from concrete hardware. Mock and real device sources share
//! the same API.

use std::sync::Arc;
use std::time::Duration;

use crate::{Event, FrameImage, TriggerSignal};

/// Event batch callback type
///
/// Invoked from the driver thread with a timestamp-sorted slice of events.
/// Uses `Arc` to allow callback sharing across multiple contexts.
pub type EventBatchCallback = Arc<dyn Fn(&[Event]) + Send + Sync>;

/// Trigger pulse callback type
pub type TriggerCallback = Arc<dyn Fn(TriggerSignal) + Send + Sync>;

/// Frame camera source trait
///
/// Pull-based: the capture loop polls for the latest image with a bounded
/// timeout. The callbacks of [`EventSource`] are the push-based half.
///
/// # Example
///
/// ```ignore
/// let source: Arc<dyn FrameSource> = get_frame_source();
/// source.start();
/// while let Some(image) = source.try_latest_image(Duration::from_millis(5)) {
///     // enqueue image ...
/// }
/// source.stop();
/// ```
pub trait FrameSource: Send + Sync {
    /// Device serial (diagnostics)
    fn serial(&self) -> &str;

    /// Poll for the newest image, waiting at most `timeout`.
    ///
    /// Returns `None` when no new frame arrived within the timeout.
    fn try_latest_image(&self, timeout: Duration) -> Option<FrameImage>;

    /// Begin acquisition. Returns false if the device refused to start.
    fn start(&self) -> bool;

    /// Stop acquisition. Idempotent.
    fn stop(&self) -> bool;

    /// Check if currently acquiring
    fn is_running(&self) -> bool;
}

/// Event camera source trait
///
/// Push-based: the driver invokes the registered callbacks from its own
/// thread. Callbacks registered after `start()` may miss data; register
/// them first. Repeated registration replaces the previous callback.
pub trait EventSource: Send + Sync {
    /// Device serial (diagnostics)
    fn serial(&self) -> &str;

    /// Register the event batch callback
    fn set_event_callback(&self, callback: EventBatchCallback);

    /// Register the trigger pulse callback
    fn set_trigger_callback(&self, callback: TriggerCallback);

    /// Begin streaming. Returns false if the device refused to start.
    fn start(&self) -> bool;

    /// Stop streaming. Idempotent.
    fn stop(&self) -> bool;

    /// Check if currently streaming
    fn is_running(&self) -> bool;
}
