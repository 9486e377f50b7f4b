//! Event stream accumulation and exposure-window cutting.
//!
//! Batches arrive timestamp-sorted from the driver, so the deque stays
//! globally sorted by construction and the window cut is a binary search.

use std::collections::VecDeque;

use contracts::{Event, PooledEventBuffer};

/// Accumulates events between frame cuts.
///
/// Successive `drain_until` calls partition the stream into contiguous,
/// disjoint, exhaustive windows `(last_end, current_end]`: every event is
/// assigned to exactly one frame.
#[derive(Debug, Default)]
pub struct EventAccumulator {
    events: VecDeque<Event>,
    last_end_ts: u64,
}

impl EventAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a timestamp-sorted batch
    pub fn append(&mut self, batch: &[Event]) {
        self.events.extend(batch.iter().copied());
    }

    /// Move every accumulated event with `timestamp_us <= end_ts` into
    /// `buf`, preserving order. Returns the number of events moved.
    pub fn drain_until(&mut self, end_ts: u64, buf: &mut PooledEventBuffer) -> usize {
        let cut = self.events.partition_point(|e| e.timestamp_us <= end_ts);
        let out = buf.events_mut();
        out.reserve(cut);
        for event in self.events.drain(..cut) {
            out.push(event);
        }
        self.last_end_ts = end_ts;
        cut
    }

    /// End timestamp of the previous cut
    #[inline]
    pub fn last_end_ts(&self) -> u64 {
        self.last_end_ts
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop all accumulated events and reset the cut position
    pub fn clear(&mut self) {
        self.events.clear();
        self.last_end_ts = 0;
    }
}
