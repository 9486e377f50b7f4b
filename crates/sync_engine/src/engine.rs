//! Synchronizer - the core matching loop.
//!
//! Zips the frame FIFO against the trigger-pair FIFO in strict arrival
//! order, cuts the accumulated event stream at each exposure end, and
//! forwards the assembled `SyncedFrame` to an injected output.
//!
//! Locking: each critical section takes exactly one of the four engine
//! locks, and no lock is held across the output call or a sleep. The
//! loop is the single consumer of both FIFOs, so peek-then-pop across
//! separate lock acquisitions cannot race.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use contracts::{SyncTuning, SyncedFrame};
use tracing::{debug, info, warn};

use crate::{EventAccumulator, EventBufferPool, FrameQueue, TriggerPairer};

/// Output callback for matched frames, invoked on the synchronizer thread.
pub type SyncOutputFn = Arc<dyn Fn(SyncedFrame) + Send + Sync>;

/// Frame/trigger/event matching engine.
///
/// Owns the shared queues; producers (capture loop, driver callbacks)
/// get `Arc` handles via the accessors and append under each queue's own
/// lock. A dedicated thread runs the matching loop with a short backoff
/// when starved.
pub struct Synchronizer {
    frames: Arc<Mutex<FrameQueue>>,
    pairer: Arc<Mutex<TriggerPairer>>,
    accumulator: Arc<Mutex<EventAccumulator>>,
    pool: Arc<EventBufferPool>,
    output: SyncOutputFn,
    backoff: Duration,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    matched_count: Arc<Mutex<u64>>,
}

impl Synchronizer {
    pub fn new(tuning: &SyncTuning, output: SyncOutputFn) -> Arc<Self> {
        Arc::new(Self {
            frames: Arc::new(Mutex::new(FrameQueue::new(tuning.frame_queue_capacity))),
            pairer: Arc::new(Mutex::new(TriggerPairer::new(tuning.trigger_queue_capacity))),
            accumulator: Arc::new(Mutex::new(EventAccumulator::new())),
            pool: EventBufferPool::new(&tuning.pool),
            output,
            backoff: Duration::from_micros(tuning.sync_backoff_us.max(1)),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            matched_count: Arc::new(Mutex::new(0)),
        })
    }

    /// Frame queue handle for the capture loop
    pub fn frames(&self) -> Arc<Mutex<FrameQueue>> {
        self.frames.clone()
    }

    /// Trigger pairer handle for the trigger callback
    pub fn pairer(&self) -> Arc<Mutex<TriggerPairer>> {
        self.pairer.clone()
    }

    /// Accumulator handle for the event batch callback
    pub fn accumulator(&self) -> Arc<Mutex<EventAccumulator>> {
        self.accumulator.clone()
    }

    /// Event buffer pool (shared with delivered frames)
    pub fn pool(&self) -> Arc<EventBufferPool> {
        self.pool.clone()
    }

    /// Frames matched since construction
    pub fn matched_count(&self) -> u64 {
        *self.matched_count.lock().unwrap()
    }

    /// Attempt one frame/pair match. Returns None when either input is
    /// starved; the starved side keeps its state untouched.
    pub fn try_match_once(&self) -> Option<SyncedFrame> {
        // Peek first: a queued pair must exist before a frame is consumed.
        {
            let mut pairer = self.pairer.lock().unwrap();
            match pairer.peek_oldest() {
                None => return None,
                Some(pair) if !pair.is_complete() => {
                    // A pair with no end pulse cannot bound a window and
                    // will never complete once queued; discard it.
                    let stale = pairer.pop_oldest();
                    warn!(?stale, "discarding incomplete trigger pair");
                    metrics::counter!("evrgb_sync_pairs_discarded_total", "reason" => "incomplete")
                        .increment(1);
                    return None;
                }
                Some(_) => {}
            }
        }

        // Single-consumer: the peeked pair cannot vanish between locks.
        let record = self.frames.lock().unwrap().pop_oldest()?;
        let pair = self.pairer.lock().unwrap().pop_oldest()?;

        let exposure_end_us = pair.exposure_end_us()?;
        let exposure_start_us = pair.exposure_start_us().unwrap_or(exposure_end_us);

        let mut events = self.pool.acquire();
        let drained = {
            let mut acc = self.accumulator.lock().unwrap();
            acc.drain_until(exposure_end_us, &mut events)
        };

        debug!(
            sequence_index = record.sequence_index,
            exposure_start_us,
            exposure_end_us,
            events = drained,
            "matched frame"
        );
        metrics::counter!("evrgb_sync_matched_frames_total").increment(1);

        Some(SyncedFrame {
            image: record.image,
            sequence_index: record.sequence_index,
            exposure_start_us,
            exposure_end_us,
            events,
        })
    }

    /// Spawn the matching thread. Idempotent.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("synchronizer already running");
            return false;
        }

        let this = self.clone();
        let handle = std::thread::Builder::new()
            .name("synchronizer".into())
            .spawn(move || this.run_loop());

        match handle {
            Ok(h) => {
                *self.handle.lock().unwrap() = Some(h);
                info!("synchronizer started");
                true
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                warn!(error = %e, "failed to spawn synchronizer thread");
                false
            }
        }
    }

    fn run_loop(&self) {
        while self.running.load(Ordering::SeqCst) {
            match self.try_match_once() {
                Some(frame) => {
                    *self.matched_count.lock().unwrap() += 1;
                    (self.output)(frame);
                }
                None => std::thread::sleep(self.backoff),
            }
        }
        debug!("synchronizer loop ended");
    }

    /// Stop and join the matching thread. Idempotent.
    pub fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
        info!("synchronizer stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Drop all queued frames, pairs, and accumulated events
    pub fn clear(&self) {
        self.frames.lock().unwrap().clear();
        self.pairer.lock().unwrap().clear();
        self.accumulator.lock().unwrap().clear();
    }

    /// Depths of the two input FIFOs (frames, trigger pairs)
    pub fn queue_depths(&self) -> (usize, usize) {
        let frames = self.frames.lock().unwrap().len();
        let pairs = self.pairer.lock().unwrap().len();
        (frames, pairs)
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        self.stop();
    }
}
