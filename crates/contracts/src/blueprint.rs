//! PipelineBlueprint - Config Loader 输出
//!
//! 描述完整的采集配置：组合结构、同步调参、数据源、录制输出。

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的采集配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 组合与同步调参
    #[serde(default)]
    pub combo: SyncTuning,

    /// 数据源配置
    pub source: SourceConfig,

    /// 录制输出配置
    #[serde(default)]
    pub recording: RecordingConfig,
}

/// 双相机光路布置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboArrangement {
    /// 并排双目
    #[default]
    Stereo,
    /// 分光镜共光轴
    BeamSplitter,
}

/// 同步引擎调参
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SyncTuning {
    /// 光路布置
    #[serde(default)]
    pub arrangement: ComboArrangement,

    /// 帧队列容量 (满时淘汰最旧帧)
    #[serde(default = "default_frame_queue_capacity")]
    #[validate(range(min = 1))]
    pub frame_queue_capacity: usize,

    /// 触发对队列容量 (满时丢弃最新对)
    #[serde(default = "default_trigger_queue_capacity")]
    #[validate(range(min = 1))]
    pub trigger_queue_capacity: usize,

    /// 同步循环空转退避 (microseconds)
    #[serde(default = "default_sync_backoff_us")]
    #[validate(range(min = 1))]
    pub sync_backoff_us: u64,

    /// 采集循环单次轮询超时 (milliseconds)
    #[serde(default = "default_capture_poll_timeout_ms")]
    #[validate(range(min = 1))]
    pub capture_poll_timeout_ms: u64,

    /// 事件缓冲池配置
    #[serde(default)]
    pub pool: PoolConfig,
}

fn default_frame_queue_capacity() -> usize {
    10
}

fn default_trigger_queue_capacity() -> usize {
    100
}

fn default_sync_backoff_us() -> u64 {
    1000
}

fn default_capture_poll_timeout_ms() -> u64 {
    5
}

impl Default for SyncTuning {
    fn default() -> Self {
        Self {
            arrangement: ComboArrangement::default(),
            frame_queue_capacity: default_frame_queue_capacity(),
            trigger_queue_capacity: default_trigger_queue_capacity(),
            sync_backoff_us: default_sync_backoff_us(),
            capture_poll_timeout_ms: default_capture_poll_timeout_ms(),
            pool: PoolConfig::default(),
        }
    }
}

/// 事件缓冲池配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct PoolConfig {
    /// 预分配缓冲数量
    #[serde(default = "default_pool_preallocated")]
    pub preallocated: usize,

    /// 单个缓冲的容量提示 (events)
    #[serde(default = "default_pool_capacity_hint")]
    #[validate(range(min = 1))]
    pub capacity_hint: usize,
}

fn default_pool_preallocated() -> usize {
    8
}

fn default_pool_capacity_hint() -> usize {
    256 * 1024
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            preallocated: default_pool_preallocated(),
            capacity_hint: default_pool_capacity_hint(),
        }
    }
}

/// 数据源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// 合成数据源 (测试/演示)
    #[default]
    Mock,
    /// 真实硬件 (需要序列号)
    Device,
}

/// 数据源配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// 数据源类型
    #[serde(default)]
    pub kind: SourceKind,

    /// 帧相机序列号 (device 模式必填)
    #[serde(default)]
    pub rgb_serial: String,

    /// 事件相机序列号 (device 模式必填)
    #[serde(default)]
    pub dvs_serial: String,

    /// Mock 数据源参数
    #[serde(default)]
    pub mock: MockSourceConfig,
}

/// Mock 数据源参数
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct MockSourceConfig {
    /// 帧率 (Hz)
    #[serde(default = "default_mock_frame_rate")]
    #[validate(range(min = 0.001))]
    pub frame_rate_hz: f64,

    /// 曝光时长 (milliseconds)，必须短于帧周期
    #[serde(default = "default_mock_exposure_ms")]
    #[validate(range(min = 0.001))]
    pub exposure_ms: f64,

    /// 事件率 (events/second)
    #[serde(default = "default_mock_event_rate")]
    #[validate(range(min = 1.0))]
    pub event_rate_hz: f64,

    /// 图像宽度
    #[serde(default = "default_mock_width")]
    #[validate(range(min = 1))]
    pub width: u32,

    /// 图像高度
    #[serde(default = "default_mock_height")]
    #[validate(range(min = 1))]
    pub height: u32,
}

fn default_mock_frame_rate() -> f64 {
    30.0
}

fn default_mock_exposure_ms() -> f64 {
    8.0
}

fn default_mock_event_rate() -> f64 {
    50_000.0
}

fn default_mock_width() -> u32 {
    640
}

fn default_mock_height() -> u32 {
    480
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: default_mock_frame_rate(),
            exposure_ms: default_mock_exposure_ms(),
            event_rate_hz: default_mock_event_rate(),
            width: default_mock_width(),
            height: default_mock_height(),
        }
    }
}

impl MockSourceConfig {
    /// 帧周期 (microseconds)
    #[inline]
    pub fn frame_period_us(&self) -> u64 {
        (1_000_000.0 / self.frame_rate_hz) as u64
    }

    /// 曝光时长 (microseconds)
    #[inline]
    pub fn exposure_us(&self) -> u64 {
        (self.exposure_ms * 1000.0) as u64
    }
}

/// 录制器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderKind {
    /// 日志摘要
    #[default]
    Log,
    /// 落盘会话 (CSV + raw events + manifest)
    Session,
}

/// 录制输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// 是否启用录制
    #[serde(default)]
    pub enabled: bool,

    /// 录制器类型
    #[serde(default)]
    pub recorder: RecorderKind,

    /// 会话输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    "./recordings".to_string()
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            recorder: RecorderKind::default(),
            output_dir: default_output_dir(),
        }
    }
}
