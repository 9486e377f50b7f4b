//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    apply_overrides(&mut blueprint, args);

    info!(
        source_kind = ?blueprint.source.kind,
        arrangement = ?blueprint.combo.arrangement,
        recording = blueprint.recording.enabled,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        max_frames: if args.max_frames == 0 {
            None
        } else {
            Some(args.max_frames)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    // Run pipeline with shutdown signal
    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        frames_delivered = stats.frames_delivered,
                        events_ingested = stats.events_ingested,
                        duration_secs = stats.duration.as_secs_f64(),
                        fps = format!("{:.2}", stats.fps()),
                        "Pipeline completed successfully"
                    );

                    // Print detailed statistics
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Pipeline execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("evrgb-sync finished");
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(blueprint: &mut contracts::PipelineBlueprint, args: &RunArgs) {
    if args.no_recording && blueprint.recording.enabled {
        info!("Disabling recording from CLI");
        blueprint.recording.enabled = false;
    }
    if let Some(serial) = &args.rgb_serial {
        info!(serial = %serial, "Overriding RGB camera serial from CLI");
        blueprint.source.rgb_serial = serial.clone();
    }
    if let Some(serial) = &args.dvs_serial {
        info!(serial = %serial, "Overriding DVS camera serial from CLI");
        blueprint.source.dvs_serial = serial.clone();
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::PipelineBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Source:");
    println!("  Kind: {:?}", blueprint.source.kind);
    if blueprint.source.kind == contracts::SourceKind::Device {
        println!("  RGB serial: {}", blueprint.source.rgb_serial);
        println!("  DVS serial: {}", blueprint.source.dvs_serial);
    } else {
        let mock = &blueprint.source.mock;
        println!("  Frame rate: {} Hz", mock.frame_rate_hz);
        println!("  Exposure: {} ms", mock.exposure_ms);
        println!("  Event rate: {} Hz", mock.event_rate_hz);
        println!("  Resolution: {}x{}", mock.width, mock.height);
    }

    let combo = &blueprint.combo;
    println!("\nSync Tuning:");
    println!("  Arrangement: {:?}", combo.arrangement);
    println!("  Frame queue capacity: {}", combo.frame_queue_capacity);
    println!("  Trigger queue capacity: {}", combo.trigger_queue_capacity);
    println!("  Sync backoff: {} us", combo.sync_backoff_us);
    println!(
        "  Pool: {} buffers x {} events",
        combo.pool.preallocated, combo.pool.capacity_hint
    );

    println!("\nRecording:");
    if blueprint.recording.enabled {
        println!("  Recorder: {:?}", blueprint.recording.recorder);
        println!("  Output dir: {}", blueprint.recording.output_dir);
    } else {
        println!("  Disabled");
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn blueprint() -> contracts::PipelineBlueprint {
        contracts::PipelineBlueprint {
            version: Default::default(),
            combo: contracts::SyncTuning::default(),
            source: contracts::SourceConfig::default(),
            recording: contracts::RecordingConfig::default(),
        }
    }

    fn args() -> RunArgs {
        RunArgs {
            config: PathBuf::from("config.toml"),
            max_frames: 0,
            timeout: 0,
            dry_run: false,
            no_recording: false,
            rgb_serial: None,
            dvs_serial: None,
            metrics_port: 0,
        }
    }

    #[test]
    fn serial_overrides_replace_blueprint_values() {
        let mut blueprint = blueprint();
        blueprint.source.rgb_serial = "RGB-FROM-FILE".into();
        blueprint.source.dvs_serial = "DVS-FROM-FILE".into();

        let mut args = args();
        args.rgb_serial = Some("RGB-OVERRIDE".into());
        apply_overrides(&mut blueprint, &args);

        assert_eq!(blueprint.source.rgb_serial, "RGB-OVERRIDE");
        assert_eq!(blueprint.source.dvs_serial, "DVS-FROM-FILE");
    }

    #[test]
    fn no_recording_flag_disables_recording() {
        let mut blueprint = blueprint();
        blueprint.recording.enabled = true;

        let mut args = args();
        args.no_recording = true;
        apply_overrides(&mut blueprint, &args);

        assert!(!blueprint.recording.enabled);
    }
}
