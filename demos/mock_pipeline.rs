//! Mock Pipeline Demo
//!
//! Demonstrates the full frame/event synchronization pipeline against
//! the mock camera sources. Runs without any camera hardware.
//!
//! Run with: cargo run --bin mock_pipeline

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::SyncedFrame;
use observability::SyncMetricsAggregator;
use rig::{build_sources, ComboPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Pipeline Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        // Minimal default: mock sources at 30 fps
        create_test_blueprint()
    };

    // ==== Stage 2: Build camera sources ====
    tracing::info!(kind = ?blueprint.source.kind, "Building camera sources...");
    let (frame_source, event_source) = build_sources(&blueprint)?;

    // ==== Stage 3: Assemble pipeline ====
    let target_frames = 50u64;
    let delivered = Arc::new(AtomicU64::new(0));
    let aggregator = Arc::new(Mutex::new(SyncMetricsAggregator::new()));

    let counter = delivered.clone();
    let agg = aggregator.clone();
    let mut builder = ComboPipeline::builder()
        .frame_source(frame_source)
        .event_source(event_source)
        .tuning(blueprint.combo.clone());

    // Optional on-disk session recording (enable it in the config file)
    if blueprint.recording.enabled {
        let recorder = dispatcher::SessionRecorder::new(&blueprint.recording.output_dir)?;
        tracing::info!(dir = %recorder.session_dir().display(), "Recording session");
        builder = builder.recorder(Arc::new(recorder));
    }

    let pipeline = builder
        .on_synced_frame(Arc::new(move |frame: &SyncedFrame| {
            tracing::info!(
                sequence_index = frame.sequence_index,
                exposure_start_us = frame.exposure_start_us,
                exposure_end_us = frame.exposure_end_us,
                events = frame.event_count(),
                "Synced frame delivered"
            );
            agg.lock().unwrap().update(frame);
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .build()?;

    // ==== Stage 4: Run ====
    tracing::info!(target_frames, "Starting pipeline...");
    pipeline.start();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    while delivered.load(Ordering::SeqCst) < target_frames
        && tokio::time::Instant::now() < deadline
    {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // ==== Stage 5: Shutdown and report ====
    tracing::info!("Shutting down...");
    pipeline.stop();

    let count = delivered.load(Ordering::SeqCst);
    if count >= target_frames {
        tracing::info!(frames = count, "Pipeline completed successfully");
    } else {
        tracing::warn!(frames = count, "Pipeline timed out before target");
    }

    println!("{}", aggregator.lock().unwrap().summary());
    Ok(())
}

fn create_test_blueprint() -> contracts::PipelineBlueprint {
    use contracts::*;

    PipelineBlueprint {
        version: ConfigVersion::V1,
        combo: SyncTuning::default(),
        source: SourceConfig {
            kind: SourceKind::Mock,
            rgb_serial: String::new(),
            dvs_serial: String::new(),
            mock: MockSourceConfig {
                frame_rate_hz: 30.0,
                exposure_ms: 8.0,
                event_rate_hz: 50_000.0,
                width: 640,
                height: 480,
            },
        },
        recording: RecordingConfig::default(),
    }
}
