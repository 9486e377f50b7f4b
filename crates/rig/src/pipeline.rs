//! ComboPipeline - the assembled frame/event synchronization rig.
//!
//! Owns the five moving parts (two sources, capture loop, synchronizer,
//! delivery worker) and wires their callbacks together. Start ordering:
//! driver callbacks are registered before any source streams, so no
//! early pulse or batch is lost.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    EventSource, FrameSource, PipelineError, Recorder, SyncTuning, SyncedFrameCallback,
};
use dispatcher::{DeliveryMetrics, DeliveryQueue, DeliveryWorker};
use ingestion::{CaptureLoop, IngestionMetrics};
use sync_engine::Synchronizer;
use tracing::{info, warn};

/// Snapshot of the three internal queue depths
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueDepths {
    pub frames: usize,
    pub trigger_pairs: usize,
    pub delivery: usize,
}

/// Builder for [`ComboPipeline`]
#[derive(Default)]
pub struct ComboPipelineBuilder {
    frame_source: Option<Arc<dyn FrameSource>>,
    event_source: Option<Arc<dyn EventSource>>,
    tuning: SyncTuning,
    recorder: Option<Arc<dyn Recorder>>,
    callback: Option<SyncedFrameCallback>,
}

impl ComboPipelineBuilder {
    pub fn frame_source(mut self, source: Arc<dyn FrameSource>) -> Self {
        self.frame_source = Some(source);
        self
    }

    pub fn event_source(mut self, source: Arc<dyn EventSource>) -> Self {
        self.event_source = Some(source);
        self
    }

    pub fn tuning(mut self, tuning: SyncTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn recorder(mut self, recorder: Arc<dyn Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Register the user callback. Must happen before `start`.
    pub fn on_synced_frame(mut self, callback: SyncedFrameCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn build(self) -> Result<ComboPipeline, PipelineError> {
        let frame_source = self
            .frame_source
            .ok_or_else(|| PipelineError::Other("frame source is required".into()))?;
        let event_source = self
            .event_source
            .ok_or_else(|| PipelineError::Other("event source is required".into()))?;

        let delivery_queue = Arc::new(DeliveryQueue::new());
        let ingestion_metrics = Arc::new(IngestionMetrics::new());

        // synchronizer output feeds the delivery queue
        let out_queue = delivery_queue.clone();
        let synchronizer = Synchronizer::new(
            &self.tuning,
            Arc::new(move |frame| out_queue.push(frame)),
        );

        // capture loop feeds the frame queue
        let frames = synchronizer.frames();
        let capture = CaptureLoop::new(
            frame_source.clone(),
            Duration::from_millis(self.tuning.capture_poll_timeout_ms.max(1)),
            Arc::new(move |image| {
                frames.lock().unwrap().push(image);
            }),
            ingestion_metrics.clone(),
        );

        let delivery = DeliveryWorker::new(
            delivery_queue.clone(),
            self.recorder.clone(),
            self.callback,
        );

        Ok(ComboPipeline {
            frame_source,
            event_source,
            synchronizer,
            capture,
            delivery,
            delivery_queue,
            recorder: self.recorder,
            ingestion_metrics,
            running: AtomicBool::new(false),
        })
    }
}

/// Assembled synchronization pipeline
pub struct ComboPipeline {
    frame_source: Arc<dyn FrameSource>,
    event_source: Arc<dyn EventSource>,
    synchronizer: Arc<Synchronizer>,
    capture: Arc<CaptureLoop>,
    delivery: Arc<DeliveryWorker>,
    delivery_queue: Arc<DeliveryQueue>,
    recorder: Option<Arc<dyn Recorder>>,
    ingestion_metrics: Arc<IngestionMetrics>,
    running: AtomicBool,
}

impl ComboPipeline {
    pub fn builder() -> ComboPipelineBuilder {
        ComboPipelineBuilder::default()
    }

    /// Start sources and worker threads. Idempotent.
    pub fn start(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("pipeline already running");
            return false;
        }

        // callbacks first: pulses arriving during source spin-up count
        let accumulator = self.synchronizer.accumulator();
        let batch_metrics = self.ingestion_metrics.clone();
        self.event_source.set_event_callback(Arc::new(move |batch| {
            batch_metrics.record_event_batch(batch.len());
            accumulator.lock().unwrap().append(batch);
        }));

        let pairer = self.synchronizer.pairer();
        let trigger_metrics = self.ingestion_metrics.clone();
        self.event_source.set_trigger_callback(Arc::new(move |signal| {
            trigger_metrics.record_trigger();
            pairer.lock().unwrap().add_trigger(signal);
        }));

        self.delivery_queue.reopen();

        if !self.event_source.start() && !self.event_source.is_running() {
            warn!(serial = self.event_source.serial(), "event source failed to start");
            self.running.store(false, Ordering::SeqCst);
            return false;
        }
        if !self.frame_source.start() && !self.frame_source.is_running() {
            warn!(serial = self.frame_source.serial(), "frame source failed to start");
            self.event_source.stop();
            self.running.store(false, Ordering::SeqCst);
            return false;
        }

        self.capture.start();
        self.synchronizer.start();
        self.delivery.start();

        info!(
            rgb = self.frame_source.serial(),
            dvs = self.event_source.serial(),
            "pipeline started"
        );
        true
    }

    /// Stop everything, join worker threads, clear buffers. Idempotent.
    pub fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }

        // drain direction: sink side first so nothing new piles up
        self.delivery.stop();
        self.synchronizer.stop();
        self.capture.stop();

        self.frame_source.stop();
        self.event_source.stop();

        if let Some(recorder) = self.recorder.as_ref() {
            recorder.stop();
        }

        self.synchronizer.clear();
        for frame in self.delivery_queue.drain() {
            drop(frame); // return pooled buffers
        }

        info!("pipeline stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Frames matched by the synchronizer since construction
    pub fn matched_count(&self) -> u64 {
        self.synchronizer.matched_count()
    }

    pub fn queue_depths(&self) -> QueueDepths {
        let (frames, trigger_pairs) = self.synchronizer.queue_depths();
        QueueDepths {
            frames,
            trigger_pairs,
            delivery: self.delivery_queue.len(),
        }
    }

    /// Retune the trigger FIFO bound at runtime
    pub fn set_trigger_capacity(&self, capacity: usize) {
        self.synchronizer.pairer().lock().unwrap().set_capacity(capacity);
    }

    /// Ingestion counters (frames captured, batches, events, triggers)
    pub fn ingestion_metrics(&self) -> Arc<IngestionMetrics> {
        self.ingestion_metrics.clone()
    }

    /// Delivery counters (delivered, record failures, callback panics)
    pub fn delivery_metrics(&self) -> Arc<DeliveryMetrics> {
        self.delivery.metrics()
    }
}

impl Drop for ComboPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{MockSourceConfig, SyncedFrame};
    use ingestion::{MockEventSource, MockFrameSource};
    use std::sync::atomic::AtomicUsize;

    fn fast_config() -> MockSourceConfig {
        MockSourceConfig {
            frame_rate_hz: 100.0,
            exposure_ms: 4.0,
            event_rate_hz: 20_000.0,
            width: 16,
            height: 16,
        }
    }

    fn build_mock_pipeline(callback: SyncedFrameCallback) -> ComboPipeline {
        let config = fast_config();
        ComboPipeline::builder()
            .frame_source(MockFrameSource::new(&config, "mock-rgb-0"))
            .event_source(MockEventSource::new(&config, "mock-dvs-0"))
            .tuning(SyncTuning::default())
            .on_synced_frame(callback)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_sources() {
        let result = ComboPipeline::builder().build();
        assert!(result.is_err());
    }

    #[test]
    fn pipeline_produces_synced_frames() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = delivered.clone();
        let pipeline = build_mock_pipeline(Arc::new(move |_: &SyncedFrame| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(pipeline.start());
        assert!(!pipeline.start()); // idempotent

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while delivered.load(Ordering::SeqCst) < 3 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }

        assert!(pipeline.stop());
        assert!(!pipeline.stop()); // idempotent
        assert!(delivered.load(Ordering::SeqCst) >= 3);

        // queues were cleared on stop
        let depths = pipeline.queue_depths();
        assert_eq!(depths.frames, 0);
        assert_eq!(depths.trigger_pairs, 0);
        assert_eq!(depths.delivery, 0);
    }

    #[test]
    fn delivered_sequence_indices_strictly_increase() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::<u64>::new()));
        let sink = seen.clone();
        let pipeline = build_mock_pipeline(Arc::new(move |frame: &SyncedFrame| {
            sink.lock().unwrap().push(frame.sequence_index);
        }));

        pipeline.start();
        std::thread::sleep(Duration::from_millis(300));
        pipeline.stop();

        let seen = seen.lock().unwrap();
        assert!(seen.len() >= 2);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }
}
