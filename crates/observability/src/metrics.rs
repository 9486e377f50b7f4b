//! 同步指标收集模块
//!
//! 基于 SyncedFrame 收集和统计同步管线的运行指标。

use contracts::SyncedFrame;
use metrics::{counter, gauge, histogram};

/// 从 SyncedFrame 记录指标
///
/// 每次交付 SyncedFrame 时调用此函数来记录指标。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_synced_frame;
///
/// pipeline_callback(|frame| {
///     record_synced_frame(frame);
///     // ...
/// });
/// ```
pub fn record_synced_frame(frame: &SyncedFrame) {
    // 帧计数器
    counter!("evrgb_sync_frames_total").increment(1);

    // 序号 (用于检测跳帧)
    gauge!("evrgb_sync_last_sequence_index").set(frame.sequence_index as f64);

    // 曝光窗口时长 (微秒)
    histogram!("evrgb_sync_exposure_duration_us").record(frame.exposure_duration_us() as f64);

    // 窗口内事件数
    counter!("evrgb_sync_events_total").increment(frame.event_count() as u64);
    histogram!("evrgb_sync_events_per_frame").record(frame.event_count() as f64);
}

/// 同步指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SyncMetricsAggregator {
    /// 总帧数
    pub total_frames: u64,

    /// 总事件数
    pub total_events: u64,

    /// 序号断档次数 (检测到跳帧)
    pub sequence_gaps: u64,

    /// 零事件窗口帧数
    pub empty_window_frames: u64,

    /// 每帧事件数统计
    pub events_stats: RunningStats,

    /// 曝光时长统计 (微秒)
    pub exposure_stats: RunningStats,

    /// 上一帧序号
    last_sequence: Option<u64>,
}

impl SyncMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, frame: &SyncedFrame) {
        self.total_frames += 1;
        self.total_events += frame.event_count() as u64;

        if let Some(last) = self.last_sequence {
            if frame.sequence_index > last + 1 {
                self.sequence_gaps += frame.sequence_index - last - 1;
            }
        }
        self.last_sequence = Some(frame.sequence_index);

        if frame.event_count() == 0 {
            self.empty_window_frames += 1;
        }

        self.events_stats.push(frame.event_count() as f64);
        self.exposure_stats.push(frame.exposure_duration_us() as f64);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            total_events: self.total_events,
            sequence_gaps: self.sequence_gaps,
            empty_window_frames: self.empty_window_frames,
            empty_window_rate: if self.total_frames > 0 {
                self.empty_window_frames as f64 / self.total_frames as f64 * 100.0
            } else {
                0.0
            },
            events_per_frame: StatsSummary::from(&self.events_stats),
            exposure_duration_us: StatsSummary::from(&self.exposure_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub total_events: u64,
    pub sequence_gaps: u64,
    pub empty_window_frames: u64,
    pub empty_window_rate: f64,
    pub events_per_frame: StatsSummary,
    pub exposure_duration_us: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Sync Metrics Summary ===")?;
        writeln!(f, "Total frames: {}", self.total_frames)?;
        writeln!(f, "Total events: {}", self.total_events)?;
        writeln!(f, "Sequence gaps: {}", self.sequence_gaps)?;
        writeln!(
            f,
            "Empty event windows: {} ({:.2}%)",
            self.empty_window_frames, self.empty_window_rate
        )?;
        writeln!(f, "Events per frame: {}", self.events_per_frame)?;
        writeln!(f, "Exposure duration (us): {}", self.exposure_duration_us)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{FrameImage, PixelFormat, PooledEventBuffer};

    fn frame(seq: u64, start: u64, end: u64, events: usize) -> SyncedFrame {
        SyncedFrame {
            image: FrameImage {
                width: 1,
                height: 1,
                format: PixelFormat::Mono8,
                data: Bytes::from_static(&[0u8]),
            },
            sequence_index: seq,
            exposure_start_us: start,
            exposure_end_us: end,
            events: PooledEventBuffer::detached(vec![Default::default(); events]),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = SyncMetricsAggregator::new();

        aggregator.update(&frame(0, 0, 8000, 120));
        aggregator.update(&frame(1, 33_333, 41_333, 0));
        // seq 2 lost
        aggregator.update(&frame(3, 100_000, 108_000, 80));

        assert_eq!(aggregator.total_frames, 3);
        assert_eq!(aggregator.total_events, 200);
        assert_eq!(aggregator.sequence_gaps, 1);
        assert_eq!(aggregator.empty_window_frames, 1);
        assert!((aggregator.exposure_stats.mean() - 8000.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = SyncMetricsAggregator::new();
        aggregator.update(&frame(0, 0, 8000, 100));
        aggregator.update(&frame(1, 33_333, 41_333, 140));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Total frames: 2"));
        assert!(output.contains("Total events: 240"));
        assert!(output.contains("Sequence gaps: 0"));
    }
}
