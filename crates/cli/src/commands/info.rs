//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    source: SourceInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    tuning: Option<TuningInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recording: Option<RecordingInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    rgb_serial: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    dvs_serial: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mock: Option<MockInfo>,
}

#[derive(Serialize)]
struct MockInfo {
    frame_rate_hz: f64,
    exposure_ms: f64,
    event_rate_hz: f64,
    width: u32,
    height: u32,
}

#[derive(Serialize)]
struct TuningInfo {
    arrangement: String,
    frame_queue_capacity: usize,
    trigger_queue_capacity: usize,
    sync_backoff_us: u64,
    capture_poll_timeout_ms: u64,
    pool_preallocated: usize,
    pool_capacity_hint: usize,
}

#[derive(Serialize)]
struct RecordingInfo {
    enabled: bool,
    recorder: String,
    output_dir: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::PipelineBlueprint, args: &InfoArgs) -> ConfigInfo {
    let mock = if blueprint.source.kind == contracts::SourceKind::Mock {
        let m = &blueprint.source.mock;
        Some(MockInfo {
            frame_rate_hz: m.frame_rate_hz,
            exposure_ms: m.exposure_ms,
            event_rate_hz: m.event_rate_hz,
            width: m.width,
            height: m.height,
        })
    } else {
        None
    };

    let tuning = if args.tuning {
        let combo = &blueprint.combo;
        Some(TuningInfo {
            arrangement: format!("{:?}", combo.arrangement),
            frame_queue_capacity: combo.frame_queue_capacity,
            trigger_queue_capacity: combo.trigger_queue_capacity,
            sync_backoff_us: combo.sync_backoff_us,
            capture_poll_timeout_ms: combo.capture_poll_timeout_ms,
            pool_preallocated: combo.pool.preallocated,
            pool_capacity_hint: combo.pool.capacity_hint,
        })
    } else {
        None
    };

    let recording = if args.recording {
        Some(RecordingInfo {
            enabled: blueprint.recording.enabled,
            recorder: format!("{:?}", blueprint.recording.recorder),
            output_dir: blueprint.recording.output_dir.clone(),
        })
    } else {
        None
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        source: SourceInfo {
            kind: format!("{:?}", blueprint.source.kind),
            rgb_serial: blueprint.source.rgb_serial.clone(),
            dvs_serial: blueprint.source.dvs_serial.clone(),
            mock,
        },
        tuning,
        recording,
    }
}

fn print_config_info(blueprint: &contracts::PipelineBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               evrgb-sync Configuration                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Source info
    println!("📷 Source");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Kind: {:?}", blueprint.source.kind);
    match blueprint.source.kind {
        contracts::SourceKind::Device => {
            println!("   ├─ RGB serial: {}", blueprint.source.rgb_serial);
            println!("   └─ DVS serial: {}", blueprint.source.dvs_serial);
        }
        contracts::SourceKind::Mock => {
            let mock = &blueprint.source.mock;
            println!(
                "   ├─ Frame: {} Hz, {} ms exposure, {}x{}",
                mock.frame_rate_hz, mock.exposure_ms, mock.width, mock.height
            );
            println!("   └─ Events: {} Hz", mock.event_rate_hz);
        }
    }

    // Sync tuning
    if args.tuning {
        let combo = &blueprint.combo;
        println!("\n⚙️  Sync Tuning");
        println!("   ├─ Arrangement: {:?}", combo.arrangement);
        println!("   ├─ Frame queue: {}", combo.frame_queue_capacity);
        println!("   ├─ Trigger queue: {}", combo.trigger_queue_capacity);
        println!("   ├─ Sync backoff: {} us", combo.sync_backoff_us);
        println!("   ├─ Capture poll: {} ms", combo.capture_poll_timeout_ms);
        println!(
            "   └─ Pool: {} x {} events",
            combo.pool.preallocated, combo.pool.capacity_hint
        );
    }

    // Recording
    if args.recording {
        println!("\n📤 Recording");
        if blueprint.recording.enabled {
            println!("   ├─ Recorder: {:?}", blueprint.recording.recorder);
            println!("   └─ Output dir: {}", blueprint.recording.output_dir);
        } else {
            println!("   └─ Disabled");
        }
    }

    println!();
}
