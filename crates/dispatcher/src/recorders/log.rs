//! LogRecorder - logs frame summary via tracing

use std::sync::atomic::{AtomicBool, Ordering};

use contracts::{PipelineError, Recorder, SyncedFrame};
use tracing::info;

/// Recorder that logs frame summaries for debugging
pub struct LogRecorder {
    name: String,
    active: AtomicBool,
}

impl LogRecorder {
    /// Create a new LogRecorder with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: AtomicBool::new(true),
        }
    }
}

impl Recorder for LogRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn record(&self, frame: &SyncedFrame) -> Result<(), PipelineError> {
        info!(
            recorder = %self.name,
            sequence_index = frame.sequence_index,
            exposure_start_us = frame.exposure_start_us,
            exposure_end_us = frame.exposure_end_us,
            exposure_us = frame.exposure_duration_us(),
            events = frame.event_count(),
            "SyncedFrame recorded"
        );
        Ok(())
    }

    fn stop(&self) {
        self.active.store(false, Ordering::Relaxed);
        info!(recorder = %self.name, "LogRecorder stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{FrameImage, PixelFormat, PooledEventBuffer};

    fn frame() -> SyncedFrame {
        SyncedFrame {
            image: FrameImage {
                width: 1,
                height: 1,
                format: PixelFormat::Mono8,
                data: Bytes::from_static(&[0u8]),
            },
            sequence_index: 7,
            exposure_start_us: 100,
            exposure_end_us: 900,
            events: PooledEventBuffer::detached(Vec::new()),
        }
    }

    #[test]
    fn record_succeeds_until_stopped() {
        let recorder = LogRecorder::new("test_log");
        assert!(recorder.is_active());
        assert!(recorder.record(&frame()).is_ok());

        recorder.stop();
        assert!(!recorder.is_active());
    }
}
