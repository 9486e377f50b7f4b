//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - Prometheus 指标导出（`evrgb_sync_*` 指标族）
//! - SyncedFrame 指标收集与统计
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init, metrics};
//!
//! // 初始化
//! observability::init()?;
//!
//! // 在同步帧回调里记录指标
//! pipeline_callback(|frame| {
//!     metrics::record_synced_frame(frame);
//! });
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_synced_frame, MetricsSummary, RunningStats, StatsSummary, SyncMetricsAggregator,
};

/// 初始化可观测性（Tracing + Prometheus）
///
/// - Tracing: JSON 格式，`RUST_LOG` 可覆盖默认级别
/// - Prometheus: 监听 0.0.0.0:9000
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
    /// 默认日志级别
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: Some(9000),
            default_log_level: "info".to_string(),
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 使用自定义配置初始化
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        install_prometheus(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// 仅初始化 Prometheus 指标（不初始化 Tracing）
///
/// 用于 Tracing 已由 CLI 初始化的场景。
pub fn init_metrics_only(port: u16) -> Result<()> {
    install_prometheus(port)
}

fn install_prometheus(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    describe_sync_metrics();
    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

/// 注册 `evrgb_sync_*` 指标族的描述信息。
fn describe_sync_metrics() {
    use ::metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

    describe_counter!(
        "evrgb_sync_frames_total",
        "Synced frames delivered downstream"
    );
    describe_counter!(
        "evrgb_sync_events_total",
        "Events windowed into delivered frames"
    );
    describe_counter!(
        "evrgb_sync_frames_captured_total",
        "Frames pulled from the frame source"
    );
    describe_counter!(
        "evrgb_sync_matched_frames_total",
        "Frame/trigger matches produced by the synchronizer"
    );
    describe_counter!(
        "evrgb_sync_frames_delivered_total",
        "Frames handed to the recorder and user callback"
    );
    describe_counter!(
        "evrgb_sync_frames_evicted_total",
        "Frames evicted from the bounded frame queue"
    );
    describe_counter!(
        "evrgb_sync_pairs_discarded_total",
        "Trigger pairs discarded before matching"
    );
    describe_counter!(
        "evrgb_sync_trigger_anomalies_total",
        "Orphan or duplicate trigger pulses recovered by the pairer"
    );
    describe_counter!(
        "evrgb_sync_record_failures_total",
        "Recorder errors tolerated during delivery"
    );
    describe_counter!(
        "evrgb_sync_callback_panics_total",
        "User callback panics caught during delivery"
    );
    describe_counter!(
        "evrgb_sync_pool_fresh_allocations_total",
        "Event buffers allocated because the pool ran dry"
    );
    describe_gauge!(
        "evrgb_sync_last_sequence_index",
        "Sequence index of the most recent synced frame"
    );
    describe_gauge!("evrgb_sync_queue_depth", "Depth of a pipeline queue");
    describe_gauge!(
        "evrgb_sync_pool_available",
        "Idle event buffers in the pool"
    );
    describe_histogram!(
        "evrgb_sync_exposure_duration_us",
        Unit::Microseconds,
        "Exposure window length per synced frame"
    );
    describe_histogram!(
        "evrgb_sync_events_per_frame",
        "Events windowed into a single frame"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, Some(9000));
        assert_eq!(config.default_log_level, "info");
        assert!(matches!(config.log_format, LogFormat::Json));
    }

    #[test]
    fn test_init_without_metrics_endpoint() {
        let config = ObservabilityConfig {
            log_format: LogFormat::Compact,
            metrics_port: None,
            default_log_level: "warn".to_string(),
        };
        assert!(init_with_config(config.clone()).is_ok());
        // the global subscriber is already set
        assert!(init_with_config(config).is_err());
    }

    #[test]
    fn test_describe_metrics_without_recorder() {
        // describe macros are no-ops until a recorder is installed
        describe_sync_metrics();
    }
}
