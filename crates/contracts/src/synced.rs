//! SyncedFrame - Synchronizer output
//!
//! One frame image joined with its exposure window and the events that
//! fell inside it.

use crate::{FrameImage, PooledEventBuffer};

/// Synchronized output unit.
///
/// Produced once per matched (frame, trigger-pair) and handed to the
/// delivery pipeline. Dropping the frame returns its event buffer to the
/// pool, so consumers must not outlive their borrow of `events`.
#[derive(Debug)]
pub struct SyncedFrame {
    /// The frame image
    pub image: FrameImage,

    /// Queue-assigned frame sequence number (strictly increasing)
    pub sequence_index: u64,

    /// Exposure window start (hardware microseconds)
    pub exposure_start_us: u64,

    /// Exposure window end (hardware microseconds)
    pub exposure_end_us: u64,

    /// Events with `timestamp_us <= exposure_end_us` accumulated since
    /// the previous frame's cut, timestamp-sorted
    pub events: PooledEventBuffer,
}

impl SyncedFrame {
    /// Exposure duration in microseconds (0 when the start pulse was missed)
    #[inline]
    pub fn exposure_duration_us(&self) -> u64 {
        self.exposure_end_us.saturating_sub(self.exposure_start_us)
    }

    /// Number of events in this frame's window
    #[inline]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Event, PixelFormat};
    use bytes::Bytes;

    fn sample_frame(start: u64, end: u64, events: usize) -> SyncedFrame {
        SyncedFrame {
            image: FrameImage {
                width: 2,
                height: 2,
                format: PixelFormat::Mono8,
                data: Bytes::from_static(&[0u8; 4]),
            },
            sequence_index: 0,
            exposure_start_us: start,
            exposure_end_us: end,
            events: PooledEventBuffer::detached(vec![Event::default(); events]),
        }
    }

    #[test]
    fn exposure_duration() {
        assert_eq!(sample_frame(1000, 9000, 0).exposure_duration_us(), 8000);
        // missed start pulse clamps to zero rather than wrapping
        assert_eq!(sample_frame(9000, 9000, 0).exposure_duration_us(), 0);
    }

    #[test]
    fn event_count() {
        assert_eq!(sample_frame(0, 1, 5).event_count(), 5);
    }
}
