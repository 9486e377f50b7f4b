//! Condition-variable-gated handoff queue.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use contracts::SyncedFrame;

struct QueueState {
    frames: VecDeque<SyncedFrame>,
    shutdown: bool,
}

/// Handoff queue between the synchronizer and the delivery worker.
///
/// Unbounded: depth is limited only by how fast the consumer drains it.
/// A persistently slow recorder or callback therefore grows this queue
/// without limit; watch the `evrgb_sync_queue_depth` gauge. Whether a
/// bound (and which drop policy) belongs here is an open question
/// inherited from the reference pipeline.
pub struct DeliveryQueue {
    state: Mutex<QueueState>,
    cond: Condvar,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                frames: VecDeque::new(),
                shutdown: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Enqueue a frame and wake the consumer. No-op after shutdown.
    pub fn push(&self, frame: SyncedFrame) {
        let mut state = self.state.lock().unwrap();
        if state.shutdown {
            return; // dropped frame reclaims its buffer on the way out
        }
        state.frames.push_back(frame);
        metrics::gauge!("evrgb_sync_queue_depth", "queue" => "delivery").set(state.frames.len() as f64);
        self.cond.notify_one();
    }

    /// Block until a frame is available or shutdown is requested.
    ///
    /// Returns `None` once shutdown has been signalled; frames still
    /// queued at that point are left for [`DeliveryQueue::drain`].
    pub fn pop_blocking(&self) -> Option<SyncedFrame> {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.shutdown {
                return None;
            }
            if let Some(frame) = state.frames.pop_front() {
                metrics::gauge!("evrgb_sync_queue_depth", "queue" => "delivery").set(state.frames.len() as f64);
                return Some(frame);
            }
            state = self.cond.wait(state).unwrap();
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().frames.is_empty()
    }

    /// Signal shutdown and wake all waiters
    pub fn shutdown(&self) {
        let mut state = self.state.lock().unwrap();
        state.shutdown = true;
        self.cond.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().unwrap().shutdown
    }

    /// Clear the shutdown flag so the queue can serve another run.
    /// Only valid once the previous consumer has been joined.
    pub fn reopen(&self) {
        self.state.lock().unwrap().shutdown = false;
    }

    /// Take every queued frame (used to reclaim buffers at shutdown)
    pub fn drain(&self) -> Vec<SyncedFrame> {
        let mut state = self.state.lock().unwrap();
        let drained = state.frames.drain(..).collect();
        metrics::gauge!("evrgb_sync_queue_depth", "queue" => "delivery").set(0.0);
        drained
    }
}

impl Default for DeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{FrameImage, PixelFormat, PooledEventBuffer};
    use std::sync::Arc;
    use std::time::Duration;

    fn frame(seq: u64) -> SyncedFrame {
        SyncedFrame {
            image: FrameImage {
                width: 1,
                height: 1,
                format: PixelFormat::Mono8,
                data: Bytes::from_static(&[0u8]),
            },
            sequence_index: seq,
            exposure_start_us: 0,
            exposure_end_us: 1,
            events: PooledEventBuffer::detached(Vec::new()),
        }
    }

    #[test]
    fn push_pop_fifo() {
        let queue = DeliveryQueue::new();
        queue.push(frame(0));
        queue.push(frame(1));

        assert_eq!(queue.pop_blocking().unwrap().sequence_index, 0);
        assert_eq!(queue.pop_blocking().unwrap().sequence_index, 1);
    }

    #[test]
    fn shutdown_wakes_blocked_consumer() {
        let queue = Arc::new(DeliveryQueue::new());
        let q = queue.clone();

        let consumer = std::thread::spawn(move || q.pop_blocking());
        std::thread::sleep(Duration::from_millis(20));
        queue.shutdown();

        assert!(consumer.join().unwrap().is_none());
    }

    #[test]
    fn shutdown_leaves_queued_frames_for_drain() {
        let queue = DeliveryQueue::new();
        queue.push(frame(0));
        queue.push(frame(1));
        queue.shutdown();

        assert!(queue.pop_blocking().is_none());
        assert_eq!(queue.drain().len(), 2);
        // pushes after shutdown are ignored
        queue.push(frame(2));
        assert!(queue.is_empty());
    }
}
