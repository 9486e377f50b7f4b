//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    source_kind: String,
    arrangement: String,
    frame_queue_capacity: usize,
    trigger_queue_capacity: usize,
    recording_enabled: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    source_kind: format!("{:?}", blueprint.source.kind),
                    arrangement: format!("{:?}", blueprint.combo.arrangement),
                    frame_queue_capacity: blueprint.combo.frame_queue_capacity,
                    trigger_queue_capacity: blueprint.combo.trigger_queue_capacity,
                    recording_enabled: blueprint.recording.enabled,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::PipelineBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if !blueprint.recording.enabled {
        warnings
            .push("Recording disabled - synced frames only reach the user callback".to_string());
    }

    // A tiny frame queue drops frames under any sync-loop stall
    if blueprint.combo.frame_queue_capacity < 3 {
        warnings.push(format!(
            "frame_queue_capacity = {} is very small - bursts will evict frames",
            blueprint.combo.frame_queue_capacity
        ));
    }

    if blueprint.source.kind == contracts::SourceKind::Mock {
        let mock = &blueprint.source.mock;
        if mock.exposure_us() * 2 > mock.frame_period_us() {
            warnings.push(format!(
                "exposure ({} us) covers more than half the frame period ({} us)",
                mock.exposure_us(),
                mock.frame_period_us()
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Source: {}", summary.source_kind);
            println!("  Arrangement: {}", summary.arrangement);
            println!("  Frame queue: {}", summary.frame_queue_capacity);
            println!("  Trigger queue: {}", summary.trigger_queue_capacity);
            println!("  Recording: {}", summary.recording_enabled);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
