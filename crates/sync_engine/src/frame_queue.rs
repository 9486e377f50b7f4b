//! Bounded frame queue with drop-oldest eviction.
//!
//! Uses index-based separation for better performance:
//! - HeapRb stores lightweight metadata (sequence index + slab key)
//! - Slab stores actual FrameImage data
//!
//! This avoids moving image payloads during queue operations.

use std::fmt;

use contracts::{FrameImage, FrameRecord};
use ringbuf::{traits::*, HeapRb};
use slab::Slab;
use tracing::warn;

/// Lightweight metadata stored in ring buffer
#[derive(Debug, Clone, Copy)]
struct FrameMeta {
    /// Queue-assigned sequence index
    sequence_index: u64,
    /// Key into the slab storage
    slab_key: usize,
}

/// FIFO of captured frames awaiting a trigger pair.
///
/// The queue assigns strictly increasing sequence indices at push time.
/// When full, the oldest frame is evicted: under backpressure recency
/// wins, stale frames would pair with stale exposures anyway.
pub struct FrameQueue {
    /// Ring buffer of metadata (sequence index + slab key)
    index: HeapRb<FrameMeta>,
    /// Actual image storage
    storage: Slab<FrameImage>,
    capacity: usize,
    next_sequence: u64,
    dropped_count: u64,
}

impl fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameQueue")
            .field("len", &self.index.occupied_len())
            .field("capacity", &self.capacity)
            .field("next_sequence", &self.next_sequence)
            .field("dropped", &self.dropped_count)
            .finish()
    }
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            index: HeapRb::new(capacity),
            storage: Slab::with_capacity(capacity),
            capacity,
            next_sequence: 0,
            dropped_count: 0,
        }
    }

    /// Enqueue a captured image, returning its assigned sequence index.
    ///
    /// If the queue is full, evicts the oldest frame first.
    pub fn push(&mut self, image: FrameImage) -> u64 {
        if self.index.is_full() {
            if let Some(old_meta) = self.index.try_pop() {
                self.storage.remove(old_meta.slab_key);
                self.dropped_count += 1;
                warn!(
                    evicted_sequence = old_meta.sequence_index,
                    capacity = self.capacity,
                    "frame queue full, evicting oldest frame"
                );
                metrics::counter!("evrgb_sync_frames_evicted_total").increment(1);
            }
        }

        let sequence_index = self.next_sequence;
        self.next_sequence += 1;

        let slab_key = self.storage.insert(image);
        let _ = self.index.try_push(FrameMeta {
            sequence_index,
            slab_key,
        });

        metrics::gauge!("evrgb_sync_queue_depth", "queue" => "frames").set(self.index.occupied_len() as f64);
        sequence_index
    }

    /// Remove and return the oldest frame
    pub fn pop_oldest(&mut self) -> Option<FrameRecord> {
        let meta = self.index.try_pop()?;
        metrics::gauge!("evrgb_sync_queue_depth", "queue" => "frames").set(self.index.occupied_len() as f64);
        Some(FrameRecord {
            image: self.storage.remove(meta.slab_key),
            sequence_index: meta.sequence_index,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames evicted due to a full queue
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// Drop all queued frames. Sequence numbering continues unchanged.
    pub fn clear(&mut self) {
        while let Some(meta) = self.index.try_pop() {
            self.storage.remove(meta.slab_key);
        }
    }
}
