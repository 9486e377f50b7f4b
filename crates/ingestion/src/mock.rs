//! Mock 相机源
//!
//! 用于无硬件环境的测试：帧源按配置帧率产出合成图像，事件源在
//! 后台线程上以 1ms 节拍产出排序事件批和曝光触发脉冲。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{
    Event, EventBatchCallback, EventSource, FrameImage, FrameSource, MockSourceConfig,
    PixelFormat, TriggerCallback, TriggerPolarity, TriggerSignal,
};
use rand::Rng;
use tracing::{debug, trace};

/// 触发异常注入开关 (测试用)
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAnomalies {
    /// 每 N 帧丢弃一次 Start 脉冲 (产生孤立 End)
    pub drop_start_every: Option<u64>,

    /// 每 N 帧重复一次 Start 脉冲 (产生残缺对)
    pub duplicate_start_every: Option<u64>,
}

struct FramePacing {
    next_due: Instant,
    frame_index: u64,
}

/// 合成帧源
///
/// `try_latest_image` 在调用方的超时内等到下一帧到期则返回图像，
/// 否则等满超时返回 None。
pub struct MockFrameSource {
    serial: String,
    config: MockSourceConfig,
    running: AtomicBool,
    pacing: Mutex<FramePacing>,
}

impl MockFrameSource {
    pub fn new(config: &MockSourceConfig, serial: &str) -> Arc<Self> {
        Arc::new(Self {
            serial: serial.to_string(),
            config: *config,
            running: AtomicBool::new(false),
            pacing: Mutex::new(FramePacing {
                next_due: Instant::now(),
                frame_index: 0,
            }),
        })
    }

    fn make_image(&self, frame_index: u64) -> FrameImage {
        let size = (self.config.width * self.config.height) as usize * 3;
        // per-frame fill value makes frames distinguishable in tests
        let fill = (frame_index % 251) as u8;
        FrameImage {
            width: self.config.width,
            height: self.config.height,
            format: PixelFormat::Rgb8,
            data: Bytes::from(vec![fill; size]),
        }
    }
}

impl FrameSource for MockFrameSource {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn try_latest_image(&self, timeout: Duration) -> Option<FrameImage> {
        if !self.running.load(Ordering::SeqCst) {
            return None;
        }

        let period = Duration::from_micros(self.config.frame_period_us().max(1));
        let now = Instant::now();

        let (due, frame_index) = {
            let mut pacing = self.pacing.lock().unwrap();
            if pacing.next_due > now + timeout {
                return None;
            }
            let due = pacing.next_due;
            let index = pacing.frame_index;
            pacing.frame_index += 1;
            // late callers resync to now instead of bursting
            pacing.next_due = due.max(now) + period;
            (due, index)
        };

        if due > now {
            std::thread::sleep(due - now);
        }
        trace!(frame_index, "mock frame produced");
        Some(self.make_image(frame_index))
    }

    fn start(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        let mut pacing = self.pacing.lock().unwrap();
        pacing.next_due = Instant::now();
        debug!(serial = %self.serial, frame_rate_hz = self.config.frame_rate_hz, "mock frame source started");
        true
    }

    fn stop(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

const TICK_US: u64 = 1000;

/// 合成事件源
///
/// 后台线程维护一个从 0 起步的虚拟硬件时钟 (microseconds)，每个
/// 节拍先发事件批、再发到期的触发脉冲，保证事件先于其窗口的切分
/// 点到达。
pub struct MockEventSource {
    serial: String,
    config: MockSourceConfig,
    anomalies: Mutex<MockAnomalies>,
    event_callback: Arc<Mutex<Option<EventBatchCallback>>>,
    trigger_callback: Arc<Mutex<Option<TriggerCallback>>>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MockEventSource {
    pub fn new(config: &MockSourceConfig, serial: &str) -> Arc<Self> {
        Arc::new(Self {
            serial: serial.to_string(),
            config: *config,
            anomalies: Mutex::new(MockAnomalies::default()),
            event_callback: Arc::new(Mutex::new(None)),
            trigger_callback: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        })
    }

    /// Configure anomaly injection. Call before `start`.
    pub fn set_anomalies(&self, anomalies: MockAnomalies) {
        *self.anomalies.lock().unwrap() = anomalies;
    }

    fn run_generator(
        config: MockSourceConfig,
        anomalies: MockAnomalies,
        event_callback: Arc<Mutex<Option<EventBatchCallback>>>,
        trigger_callback: Arc<Mutex<Option<TriggerCallback>>>,
        running: Arc<AtomicBool>,
    ) {
        let mut rng = rand::rng();
        let events_per_tick = ((config.event_rate_hz / 1_000_000.0) * TICK_US as f64).max(1.0) as u64;
        let period_us = config.frame_period_us().max(2);
        let exposure_us = config.exposure_us().min(period_us - 1).max(1);

        let mut clock_us: u64 = 0;
        let mut frame_index: u64 = 0;
        // pulses due inside the current tick, at most one start + one end
        let mut pending_end_at: Option<u64> = None;

        debug!(
            events_per_tick,
            period_us, exposure_us, "mock event generator started"
        );

        while running.load(Ordering::SeqCst) {
            let tick_end = clock_us + TICK_US;

            // events first, so the accumulator is ahead of any cut point
            let mut batch = Vec::with_capacity(events_per_tick as usize);
            for i in 0..events_per_tick {
                batch.push(Event {
                    timestamp_us: clock_us + (i * TICK_US) / events_per_tick,
                    x: rng.random_range(0..config.width as u16),
                    y: rng.random_range(0..config.height as u16),
                    polarity: if rng.random_bool(0.5) { 1 } else { -1 },
                    reserved: 0,
                });
            }
            if let Some(cb) = event_callback.lock().unwrap().clone() {
                cb(&batch);
            }

            // trigger pulses due inside this tick; a due end fires before
            // the next start, its timestamp is older
            let trigger_cb = trigger_callback.lock().unwrap().clone();
            if let Some(end_due) = pending_end_at {
                if end_due < tick_end {
                    if let Some(cb) = trigger_cb.as_ref() {
                        cb(TriggerSignal {
                            trigger_id: 0,
                            polarity: TriggerPolarity::End,
                            timestamp_us: end_due,
                        });
                    }
                    pending_end_at = None;
                }
            }
            let start_due = frame_index * period_us;
            if start_due < tick_end {
                let skip = anomalies
                    .drop_start_every
                    .is_some_and(|n| n > 0 && (frame_index + 1) % n == 0);
                let dup = anomalies
                    .duplicate_start_every
                    .is_some_and(|n| n > 0 && (frame_index + 1) % n == 0);

                if let Some(cb) = trigger_cb.as_ref() {
                    let start = TriggerSignal {
                        trigger_id: 0,
                        polarity: TriggerPolarity::Start,
                        timestamp_us: start_due.max(clock_us),
                    };
                    if !skip {
                        cb(start);
                    }
                    if dup {
                        cb(TriggerSignal {
                            timestamp_us: start.timestamp_us + 1,
                            ..start
                        });
                    }
                }
                pending_end_at = Some(start_due + exposure_us);
                frame_index += 1;
            }

            clock_us = tick_end;
            std::thread::sleep(Duration::from_micros(TICK_US));
        }

        debug!("mock event generator stopped");
    }
}

impl EventSource for MockEventSource {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn set_event_callback(&self, callback: EventBatchCallback) {
        *self.event_callback.lock().unwrap() = Some(callback);
    }

    fn set_trigger_callback(&self, callback: TriggerCallback) {
        *self.trigger_callback.lock().unwrap() = Some(callback);
    }

    fn start(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }

        let config = self.config;
        let anomalies = *self.anomalies.lock().unwrap();
        let event_callback = self.event_callback.clone();
        let trigger_callback = self.trigger_callback.clone();
        let running = self.running.clone();

        let handle = std::thread::Builder::new()
            .name("mock-dvs".into())
            .spawn(move || {
                Self::run_generator(config, anomalies, event_callback, trigger_callback, running)
            });

        match handle {
            Ok(h) => {
                *self.handle.lock().unwrap() = Some(h);
                true
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
        true
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    fn fast_config() -> MockSourceConfig {
        MockSourceConfig {
            frame_rate_hz: 200.0,
            exposure_ms: 2.0,
            event_rate_hz: 10_000.0,
            width: 32,
            height: 32,
        }
    }

    #[test]
    fn mock_frame_source_paces_frames() {
        let source = MockFrameSource::new(&fast_config(), "mock-rgb");
        assert!(source.try_latest_image(Duration::from_millis(10)).is_none());

        source.start();
        let image = source.try_latest_image(Duration::from_millis(50)).unwrap();
        assert_eq!(image.width, 32);
        assert_eq!(image.format, PixelFormat::Rgb8);
        assert_eq!(image.data.len(), image.expected_len());
        source.stop();
    }

    #[test]
    fn mock_event_source_emits_sorted_batches_and_pairs() {
        let source = MockEventSource::new(&fast_config(), "mock-dvs");

        let batches = Arc::new(AtomicU64::new(0));
        let sorted = Arc::new(AtomicBool::new(true));
        let starts = Arc::new(AtomicU64::new(0));
        let ends = Arc::new(AtomicU64::new(0));

        {
            let batches = batches.clone();
            let sorted = sorted.clone();
            source.set_event_callback(Arc::new(move |events: &[Event]| {
                batches.fetch_add(1, Ordering::Relaxed);
                if events.windows(2).any(|w| w[0].timestamp_us > w[1].timestamp_us) {
                    sorted.store(false, Ordering::Relaxed);
                }
            }));
        }
        {
            let starts = starts.clone();
            let ends = ends.clone();
            source.set_trigger_callback(Arc::new(move |signal: TriggerSignal| {
                match signal.polarity {
                    TriggerPolarity::Start => starts.fetch_add(1, Ordering::Relaxed),
                    TriggerPolarity::End => ends.fetch_add(1, Ordering::Relaxed),
                };
            }));
        }

        source.start();
        std::thread::sleep(Duration::from_millis(100));
        source.stop();

        assert!(batches.load(Ordering::Relaxed) > 10);
        assert!(sorted.load(Ordering::Relaxed));
        assert!(starts.load(Ordering::Relaxed) >= 5);
        assert!(ends.load(Ordering::Relaxed) >= 5);
    }

    #[test]
    fn end_pulse_survives_sub_tick_gap_to_next_start() {
        // 400 Hz with 2.3 ms exposure leaves a 200 us gap, so each end
        // lands in the same tick as the following start
        let config = MockSourceConfig {
            frame_rate_hz: 400.0,
            exposure_ms: 2.3,
            event_rate_hz: 1_000.0,
            width: 32,
            height: 32,
        };
        let source = MockEventSource::new(&config, "mock-dvs");

        let starts = Arc::new(AtomicU64::new(0));
        let ends = Arc::new(AtomicU64::new(0));
        let ordered = Arc::new(AtomicBool::new(true));
        {
            let starts = starts.clone();
            let ends = ends.clone();
            let ordered = ordered.clone();
            let last_ts = Arc::new(AtomicU64::new(0));
            source.set_trigger_callback(Arc::new(move |signal: TriggerSignal| {
                if signal.timestamp_us < last_ts.load(Ordering::Relaxed) {
                    ordered.store(false, Ordering::Relaxed);
                }
                last_ts.store(signal.timestamp_us, Ordering::Relaxed);
                match signal.polarity {
                    TriggerPolarity::Start => starts.fetch_add(1, Ordering::Relaxed),
                    TriggerPolarity::End => ends.fetch_add(1, Ordering::Relaxed),
                };
            }));
        }

        source.start();
        std::thread::sleep(Duration::from_millis(100));
        source.stop();

        let s = starts.load(Ordering::Relaxed);
        let e = ends.load(Ordering::Relaxed);
        assert!(s >= 10, "expected a steady pulse train, got {s} starts");
        // every start but the last unfinished exposure has its end
        assert!(s - e <= 1, "ends fell behind: starts={s} ends={e}");
        assert!(ordered.load(Ordering::Relaxed), "pulse timestamps regressed");
    }

    #[test]
    fn anomaly_knob_drops_start_pulses() {
        let source = MockEventSource::new(&fast_config(), "mock-dvs");
        source.set_anomalies(MockAnomalies {
            drop_start_every: Some(2),
            duplicate_start_every: None,
        });

        let starts = Arc::new(AtomicU64::new(0));
        let ends = Arc::new(AtomicU64::new(0));
        {
            let starts = starts.clone();
            let ends = ends.clone();
            source.set_trigger_callback(Arc::new(move |signal: TriggerSignal| {
                match signal.polarity {
                    TriggerPolarity::Start => starts.fetch_add(1, Ordering::Relaxed),
                    TriggerPolarity::End => ends.fetch_add(1, Ordering::Relaxed),
                };
            }));
        }

        source.start();
        std::thread::sleep(Duration::from_millis(100));
        source.stop();

        // every other start is suppressed but every end still fires
        let s = starts.load(Ordering::Relaxed);
        let e = ends.load(Ordering::Relaxed);
        assert!(e > s, "expected more ends ({e}) than starts ({s})");
    }
}
