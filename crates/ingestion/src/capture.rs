//! Frame capture loop.
//!
//! Single producer of the frame queue: polls the frame source with a
//! bounded timeout and hands each image to the injected sink. The sink
//! is wired by the assembly layer to `FrameQueue::push`, keeping this
//! crate decoupled from the engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use contracts::{FrameImage, FrameSource};
use tracing::{debug, info, warn};

use crate::IngestionMetrics;

/// Destination for captured frames
pub type FrameSinkFn = Arc<dyn Fn(FrameImage) + Send + Sync>;

/// Owns the frame producer thread.
pub struct CaptureLoop {
    source: Arc<dyn FrameSource>,
    sink: FrameSinkFn,
    poll_timeout: Duration,
    metrics: Arc<IngestionMetrics>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

const STARVE_SLEEP: Duration = Duration::from_millis(1);

impl CaptureLoop {
    pub fn new(
        source: Arc<dyn FrameSource>,
        poll_timeout: Duration,
        sink: FrameSinkFn,
        metrics: Arc<IngestionMetrics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            source,
            sink,
            poll_timeout,
            metrics,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        })
    }

    /// Spawn the capture thread. Idempotent.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("capture loop already running");
            return false;
        }

        let this = self.clone();
        let handle = std::thread::Builder::new()
            .name("frame-capture".into())
            .spawn(move || this.run_loop());

        match handle {
            Ok(h) => {
                *self.handle.lock().unwrap() = Some(h);
                info!(serial = self.source.serial(), "capture loop started");
                true
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                warn!(error = %e, "failed to spawn capture thread");
                false
            }
        }
    }

    fn run_loop(&self) {
        while self.running.load(Ordering::SeqCst) {
            match self.source.try_latest_image(self.poll_timeout) {
                Some(image) => {
                    self.metrics.record_frame();
                    metrics::counter!("evrgb_sync_frames_captured_total").increment(1);
                    (self.sink)(image);
                }
                None => std::thread::sleep(STARVE_SLEEP),
            }
        }
        debug!("capture loop ended");
    }

    /// Stop and join the capture thread. Idempotent.
    pub fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
        info!("capture loop stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
