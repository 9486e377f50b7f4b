//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// evrgb-sync - Frame/event camera synchronization pipeline
#[derive(Parser, Debug)]
#[command(
    name = "evrgb-sync",
    author,
    version,
    about = "Frame/event camera synchronization pipeline",
    long_about = "A hardware-trigger-based synchronization pipeline for combined \n\
                  frame and event cameras.\n\n\
                  Pairs trigger pulses into exposure windows, cuts the event \n\
                  stream per frame, and delivers synced frames to a recorder \n\
                  and user callback."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "EVRGB_SYNC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "EVRGB_SYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the synchronization pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "EVRGB_SYNC_CONFIG")]
    pub config: PathBuf,

    /// Maximum number of synced frames to deliver (0 = unlimited)
    #[arg(long, default_value = "0", env = "EVRGB_SYNC_MAX_FRAMES")]
    pub max_frames: u64,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "EVRGB_SYNC_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Force-disable recording regardless of configuration
    #[arg(long)]
    pub no_recording: bool,

    /// Override the frame camera serial from the configuration
    #[arg(long, env = "EVRGB_SYNC_RGB_SERIAL")]
    pub rgb_serial: Option<String>,

    /// Override the event camera serial from the configuration
    #[arg(long, env = "EVRGB_SYNC_DVS_SERIAL")]
    pub dvs_serial: Option<String>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "EVRGB_SYNC_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sync tuning details
    #[arg(long)]
    pub tuning: bool,

    /// Show recording configuration
    #[arg(long)]
    pub recording: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
