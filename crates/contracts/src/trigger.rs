//! TriggerSignal / TriggerPair - 同步脉冲原语
//!
//! 帧相机的曝光由硬件触发脉冲界定：每次曝光产生一个 Start 脉冲
//! 和一个 End 脉冲，时间戳来自事件相机的时钟域。

use serde::{Deserialize, Serialize};

/// 触发脉冲极性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolarity {
    /// 曝光开始 (上升沿)
    Start,
    /// 曝光结束 (下降沿)
    End,
}

/// 单个触发脉冲
///
/// 由事件相机硬件在帧曝光边沿产生。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSignal {
    /// 触发通道 ID
    pub trigger_id: i16,

    /// 脉冲极性
    pub polarity: TriggerPolarity,

    /// 硬件时间戳 (microseconds, u64) - 主时钟
    pub timestamp_us: u64,
}

/// 一次曝光的脉冲对
///
/// `start` 或 `end` 可能缺失：孤立的 End 脉冲产生 `{None, end}`，
/// 连续两个 Start 脉冲产生 `{start, None}`。一旦 `end` 就位即视为完整。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPair {
    /// 曝光开始脉冲 (可能缺失)
    pub start: Option<TriggerSignal>,

    /// 曝光结束脉冲 (可能缺失)
    pub end: Option<TriggerSignal>,
}

impl TriggerPair {
    /// Both slots empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// A pair is complete once the end pulse is present
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.end.is_some()
    }

    /// Clear both slots
    #[inline]
    pub fn reset(&mut self) {
        self.start = None;
        self.end = None;
    }

    /// Exposure start timestamp; falls back to the end pulse when
    /// the start pulse was missed (first frame after power-on).
    #[inline]
    pub fn exposure_start_us(&self) -> Option<u64> {
        self.start
            .map(|s| s.timestamp_us)
            .or_else(|| self.end.map(|e| e.timestamp_us))
    }

    /// Exposure end timestamp
    #[inline]
    pub fn exposure_end_us(&self) -> Option<u64> {
        self.end.map(|e| e.timestamp_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse(polarity: TriggerPolarity, ts: u64) -> TriggerSignal {
        TriggerSignal {
            trigger_id: 0,
            polarity,
            timestamp_us: ts,
        }
    }

    #[test]
    fn pair_completeness() {
        let mut pair = TriggerPair::default();
        assert!(pair.is_empty());
        assert!(!pair.is_complete());

        pair.start = Some(pulse(TriggerPolarity::Start, 1000));
        assert!(!pair.is_empty());
        assert!(!pair.is_complete());

        pair.end = Some(pulse(TriggerPolarity::End, 9000));
        assert!(pair.is_complete());
        assert_eq!(pair.exposure_start_us(), Some(1000));
        assert_eq!(pair.exposure_end_us(), Some(9000));

        pair.reset();
        assert!(pair.is_empty());
    }

    #[test]
    fn orphan_end_falls_back_to_end_timestamp() {
        let pair = TriggerPair {
            start: None,
            end: Some(pulse(TriggerPolarity::End, 5000)),
        };
        assert!(pair.is_complete());
        assert_eq!(pair.exposure_start_us(), Some(5000));
    }
}
