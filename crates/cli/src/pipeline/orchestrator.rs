//! Pipeline orchestrator - coordinates all components.
//!
//! Builds sources and recorder from the blueprint, assembles a
//! `ComboPipeline`, and supervises the run: frame limit, timeout, and
//! statistics collection.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{PipelineBlueprint, Recorder, RecorderKind, SyncedFrame};
use dispatcher::{LogRecorder, SessionRecorder};
use observability::{record_synced_frame, SyncMetricsAggregator};
use rig::{build_sources, ComboPipeline};
use tracing::{info, warn};

use super::PipelineStats;

/// Supervision poll interval
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The pipeline blueprint configuration
    pub blueprint: PipelineBlueprint,

    /// Maximum number of frames to deliver (None = unlimited)
    pub max_frames: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Build camera sources
        info!(kind = ?blueprint.source.kind, "Building camera sources...");
        let (frame_source, event_source) =
            build_sources(blueprint).context("Failed to build camera sources")?;

        // Build recorder (optional)
        let recorder = build_recorder(blueprint).context("Failed to create recorder")?;
        if let Some(ref r) = recorder {
            info!(recorder = r.name(), "Recorder configured");
        }

        // Aggregate per-frame metrics in the delivery callback
        let aggregator = Arc::new(Mutex::new(SyncMetricsAggregator::new()));
        let agg = aggregator.clone();
        let callback = Arc::new(move |frame: &SyncedFrame| {
            record_synced_frame(frame);
            agg.lock().unwrap().update(frame);
        });

        // Assemble pipeline
        let mut builder = ComboPipeline::builder()
            .frame_source(frame_source)
            .event_source(event_source)
            .tuning(blueprint.combo.clone())
            .on_synced_frame(callback);
        if let Some(r) = recorder {
            builder = builder.recorder(r);
        }
        let pipeline = builder.build().context("Failed to assemble pipeline")?;

        if !pipeline.start() {
            anyhow::bail!("Pipeline failed to start");
        }
        info!(max_frames = ?self.config.max_frames, "Pipeline running");

        // Supervise: poll delivery progress until the limit or timeout
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let delivered = pipeline.delivery_metrics().delivered();
            if let Some(max) = self.config.max_frames {
                if delivered >= max {
                    info!(frames = delivered, "Reached max frames limit");
                    break;
                }
            }

            if let Some(timeout) = self.config.timeout {
                if start_time.elapsed() >= timeout {
                    warn!(timeout_secs = timeout.as_secs(), "Pipeline timed out");
                    break;
                }
            }

            if self.config.max_frames.is_none() && self.config.timeout.is_none() {
                // unbounded run: keep going until the shutdown signal
                // cancels this future from the caller's select
                continue;
            }
        }

        // Shutdown
        info!("Shutting down pipeline...");
        pipeline.stop();

        let stats = collect_stats(&pipeline, &aggregator, start_time.elapsed());

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Build the recorder described by the blueprint, if recording is enabled
fn build_recorder(blueprint: &PipelineBlueprint) -> Result<Option<Arc<dyn Recorder>>> {
    if !blueprint.recording.enabled {
        return Ok(None);
    }

    let recorder: Arc<dyn Recorder> = match blueprint.recording.recorder {
        RecorderKind::Log => Arc::new(LogRecorder::new("log")),
        RecorderKind::Session => Arc::new(
            SessionRecorder::new(&blueprint.recording.output_dir)
                .context("Failed to create session recorder")?,
        ),
    };
    Ok(Some(recorder))
}

/// Gather counters from the pipeline into a stats report
fn collect_stats(
    pipeline: &ComboPipeline,
    aggregator: &Arc<Mutex<SyncMetricsAggregator>>,
    duration: Duration,
) -> PipelineStats {
    let ingestion = pipeline.ingestion_metrics().snapshot();
    let delivery = pipeline.delivery_metrics().snapshot();

    PipelineStats {
        frames_delivered: delivery.delivered,
        frames_captured: ingestion.frames_captured,
        events_ingested: ingestion.events,
        triggers_ingested: ingestion.triggers,
        record_failures: delivery.record_failures,
        callback_panics: delivery.callback_panics,
        duration,
        sync_metrics: aggregator.lock().unwrap().clone(),
    }
}
