//! Trigger pulse pairing with anomaly recovery.
//!
//! The hardware emits a Start pulse and an End pulse per exposure, but
//! pulses can be missed or duplicated (power-on mid-exposure, cable
//! glitches). The pairer classifies every pulse against one pending pair
//! and always re-arms so a single anomaly never blocks later frames.

use std::collections::VecDeque;

use contracts::{TriggerPair, TriggerPolarity, TriggerSignal};
use tracing::warn;

/// Pairs raw trigger pulses into per-exposure `TriggerPair`s.
///
/// Plain struct; shared behind `Arc<Mutex<_>>` between the trigger
/// callback (producer) and the synchronizer loop (single consumer).
#[derive(Debug)]
pub struct TriggerPairer {
    pending: TriggerPair,
    queue: VecDeque<TriggerPair>,
    capacity: usize,
    orphan_count: u64,
    broken_count: u64,
    dropped_count: u64,
}

impl TriggerPairer {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: TriggerPair::default(),
            queue: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            orphan_count: 0,
            broken_count: 0,
            dropped_count: 0,
        }
    }

    /// Classify one pulse. Returns true when a pair was enqueued.
    pub fn add_trigger(&mut self, signal: TriggerSignal) -> bool {
        match (self.pending.is_empty(), signal.polarity) {
            // Normal first half of an exposure
            (true, TriggerPolarity::Start) => {
                self.pending.start = Some(signal);
                false
            }
            // End with no start: exposure began before we were listening
            (true, TriggerPolarity::End) => {
                self.orphan_count += 1;
                warn!(
                    timestamp_us = signal.timestamp_us,
                    "orphan end pulse, pairing without start"
                );
                metrics::counter!("evrgb_sync_trigger_anomalies_total", "kind" => "orphan_end").increment(1);
                self.enqueue(TriggerPair {
                    start: None,
                    end: Some(signal),
                })
            }
            // Normal second half
            (false, TriggerPolarity::End) => {
                let mut pair = self.pending;
                pair.end = Some(signal);
                self.pending.reset();
                self.enqueue(pair)
            }
            // Two starts in a row: the first exposure's end was missed
            (false, TriggerPolarity::Start) => {
                self.broken_count += 1;
                warn!(
                    stale_start_us = self.pending.start.map(|s| s.timestamp_us),
                    new_start_us = signal.timestamp_us,
                    "duplicate start pulse, emitting broken pair"
                );
                metrics::counter!("evrgb_sync_trigger_anomalies_total", "kind" => "broken_pair").increment(1);
                let broken = self.pending;
                self.pending = TriggerPair {
                    start: Some(signal),
                    end: None,
                };
                self.enqueue(broken)
            }
        }
    }

    /// Enqueue a finished pair, dropping it when the FIFO is full.
    ///
    /// Drop-newest: pairs already queued stay matched to frames already
    /// queued; discarding the incoming pair keeps the two FIFOs aligned.
    fn enqueue(&mut self, pair: TriggerPair) -> bool {
        if self.queue.len() >= self.capacity {
            self.dropped_count += 1;
            warn!(
                capacity = self.capacity,
                end_us = pair.exposure_end_us(),
                "trigger queue full, dropping newest pair"
            );
            metrics::counter!("evrgb_sync_pairs_discarded_total", "reason" => "queue_full")
                .increment(1);
            return false;
        }
        self.queue.push_back(pair);
        metrics::gauge!("evrgb_sync_queue_depth", "queue" => "trigger_pairs").set(self.queue.len() as f64);
        true
    }

    /// Remove and return the oldest queued pair
    #[inline]
    pub fn pop_oldest(&mut self) -> Option<TriggerPair> {
        let pair = self.queue.pop_front();
        metrics::gauge!("evrgb_sync_queue_depth", "queue" => "trigger_pairs").set(self.queue.len() as f64);
        pair
    }

    /// Look at the oldest queued pair without removing it
    #[inline]
    pub fn peek_oldest(&self) -> Option<&TriggerPair> {
        self.queue.front()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop all queued pairs and the pending half-pair
    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.reset();
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the queue bound; shrinking evicts oldest pairs first.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.queue.len() > self.capacity {
            self.queue.pop_front();
            self.dropped_count += 1;
            warn!(capacity = self.capacity, "trigger capacity shrunk, evicting oldest pair");
        }
    }

    /// Pairs emitted with no start pulse
    #[inline]
    pub fn orphan_count(&self) -> u64 {
        self.orphan_count
    }

    /// Pairs emitted with no end pulse
    #[inline]
    pub fn broken_count(&self) -> u64 {
        self.broken_count
    }

    /// Pairs discarded because the queue was full
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(ts: u64) -> TriggerSignal {
        TriggerSignal {
            trigger_id: 0,
            polarity: TriggerPolarity::Start,
            timestamp_us: ts,
        }
    }

    fn end(ts: u64) -> TriggerSignal {
        TriggerSignal {
            trigger_id: 0,
            polarity: TriggerPolarity::End,
            timestamp_us: ts,
        }
    }

    #[test]
    fn alternating_pulses_pair_in_order() {
        let mut pairer = TriggerPairer::new(10);

        for i in 0..3u64 {
            let base = i * 33_000;
            assert!(!pairer.add_trigger(start(base)));
            assert!(pairer.add_trigger(end(base + 8000)));
        }

        assert_eq!(pairer.len(), 3);
        for i in 0..3u64 {
            let pair = pairer.pop_oldest().unwrap();
            assert_eq!(pair.exposure_start_us(), Some(i * 33_000));
            assert_eq!(pair.exposure_end_us(), Some(i * 33_000 + 8000));
            assert!(pair.exposure_start_us() < pair.exposure_end_us());
        }
    }

    #[test]
    fn orphan_end_pairs_immediately() {
        let mut pairer = TriggerPairer::new(10);

        assert!(pairer.add_trigger(end(5000)));
        assert_eq!(pairer.orphan_count(), 1);

        let pair = pairer.pop_oldest().unwrap();
        assert!(pair.start.is_none());
        assert_eq!(pair.exposure_end_us(), Some(5000));

        // subsequent normal pairing is unaffected
        pairer.add_trigger(start(10_000));
        assert!(pairer.add_trigger(end(18_000)));
        assert_eq!(pairer.pop_oldest().unwrap().exposure_start_us(), Some(10_000));
    }

    #[test]
    fn duplicate_start_emits_broken_pair_and_rearms() {
        let mut pairer = TriggerPairer::new(10);

        pairer.add_trigger(start(1000));
        assert!(pairer.add_trigger(start(34_000)));
        assert_eq!(pairer.broken_count(), 1);

        let broken = pairer.pop_oldest().unwrap();
        assert_eq!(broken.start.map(|s| s.timestamp_us), Some(1000));
        assert!(broken.end.is_none());
        assert!(!broken.is_complete());

        // the second start is armed as the new pending pair
        assert!(pairer.add_trigger(end(42_000)));
        let pair = pairer.pop_oldest().unwrap();
        assert_eq!(pair.exposure_start_us(), Some(34_000));
        assert_eq!(pair.exposure_end_us(), Some(42_000));
    }

    #[test]
    fn full_queue_drops_newest() {
        let mut pairer = TriggerPairer::new(2);

        pairer.add_trigger(start(0));
        pairer.add_trigger(end(1));
        pairer.add_trigger(start(10));
        pairer.add_trigger(end(11));
        // queue full, this pair is dropped
        pairer.add_trigger(start(20));
        assert!(!pairer.add_trigger(end(21)));

        assert_eq!(pairer.len(), 2);
        assert_eq!(pairer.dropped_count(), 1);
        assert_eq!(pairer.pop_oldest().unwrap().exposure_end_us(), Some(1));
    }

    #[test]
    fn shrink_capacity_evicts_oldest() {
        let mut pairer = TriggerPairer::new(4);
        for i in 0..4u64 {
            pairer.add_trigger(start(i * 100));
            pairer.add_trigger(end(i * 100 + 50));
        }

        pairer.set_capacity(2);
        assert_eq!(pairer.len(), 2);
        assert_eq!(pairer.pop_oldest().unwrap().exposure_start_us(), Some(200));
    }

    #[test]
    fn clear_resets_pending() {
        let mut pairer = TriggerPairer::new(4);
        pairer.add_trigger(start(100));
        pairer.clear();

        // without the clear this end would complete the pending pair
        assert!(pairer.add_trigger(end(200)));
        assert_eq!(pairer.orphan_count(), 1);
    }
}
