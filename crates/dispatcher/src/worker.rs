//! Delivery worker - single consumer of the delivery queue.
//!
//! Per frame, in order: recorder, user callback, buffer return (via
//! drop). Recorder failures and callback panics are isolated so one bad
//! frame never takes the pipeline down.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use contracts::{Recorder, SyncedFrame, SyncedFrameCallback};
use tracing::{debug, error, info, warn};

use crate::{DeliveryMetrics, DeliveryQueue};

pub struct DeliveryWorker {
    queue: Arc<DeliveryQueue>,
    recorder: Option<Arc<dyn Recorder>>,
    callback: Option<SyncedFrameCallback>,
    metrics: Arc<DeliveryMetrics>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DeliveryWorker {
    pub fn new(
        queue: Arc<DeliveryQueue>,
        recorder: Option<Arc<dyn Recorder>>,
        callback: Option<SyncedFrameCallback>,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue,
            recorder,
            callback,
            metrics: Arc::new(DeliveryMetrics::new()),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        })
    }

    pub fn metrics(&self) -> Arc<DeliveryMetrics> {
        self.metrics.clone()
    }

    /// Spawn the delivery thread. Idempotent.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("delivery worker already running");
            return false;
        }

        let this = self.clone();
        let handle = std::thread::Builder::new()
            .name("delivery".into())
            .spawn(move || this.run_loop());

        match handle {
            Ok(h) => {
                *self.handle.lock().unwrap() = Some(h);
                info!("delivery worker started");
                true
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                warn!(error = %e, "failed to spawn delivery thread");
                false
            }
        }
    }

    fn run_loop(&self) {
        while let Some(frame) = self.queue.pop_blocking() {
            self.deliver(frame);
        }

        // shutdown: discard undelivered frames so their buffers return
        // to the pool
        let leftover = self.queue.drain();
        if !leftover.is_empty() {
            self.metrics.add_discarded(leftover.len() as u64);
            debug!(count = leftover.len(), "discarding undelivered frames at shutdown");
        }
        debug!("delivery loop ended");
    }

    fn deliver(&self, frame: SyncedFrame) {
        if let Some(recorder) = self.recorder.as_ref() {
            if recorder.is_active() {
                if let Err(e) = recorder.record(&frame) {
                    self.metrics.inc_record_failures();
                    error!(
                        recorder = recorder.name(),
                        sequence_index = frame.sequence_index,
                        error = %e,
                        "record failed"
                    );
                    metrics::counter!("evrgb_sync_record_failures_total").increment(1);
                    // fall through: the callback still runs
                }
            }
        }

        if let Some(callback) = self.callback.as_ref() {
            let result = catch_unwind(AssertUnwindSafe(|| callback(&frame)));
            if result.is_err() {
                self.metrics.inc_callback_panics();
                error!(
                    sequence_index = frame.sequence_index,
                    "user callback panicked"
                );
                metrics::counter!("evrgb_sync_callback_panics_total").increment(1);
            }
        }

        self.metrics.inc_delivered();
        metrics::counter!("evrgb_sync_frames_delivered_total").increment(1);
        // frame drops here, returning its event buffer to the pool
    }

    /// Signal shutdown and join the delivery thread. Idempotent.
    pub fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.queue.shutdown();
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
        info!("delivery worker stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for DeliveryWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
