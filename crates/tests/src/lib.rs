//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需硬件）
//! - 管线生命周期回归

#[cfg(test)]
mod contract_tests {
    use contracts::Event;

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_event_wire_layout() {
        // on-disk format: 16 bytes per event, castable as raw bytes
        assert_eq!(std::mem::size_of::<Event>(), 16);

        let events = [
            Event {
                timestamp_us: 42,
                x: 1,
                y: 2,
                polarity: -1,
                reserved: 0,
            },
            Event {
                timestamp_us: 43,
                x: 3,
                y: 4,
                polarity: 1,
                reserved: 0,
            },
        ];
        let raw: &[u8] = bytemuck::cast_slice(&events);
        assert_eq!(raw.len(), 32);

        let back: &[Event] = bytemuck::cast_slice(raw);
        assert_eq!(back[1].timestamp_us, 43);
        assert_eq!(back[0].polarity, -1);
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use rig::build_sources;

    const MOCK_TOML: &str = r#"
[combo]
frame_queue_capacity = 4

[source]
kind = "mock"

[source.mock]
frame_rate_hz = 100.0
exposure_ms = 4.0
event_rate_hz = 20000.0
width = 32
height = 32
"#;

    #[test]
    fn test_blueprint_builds_runnable_sources() {
        let blueprint = ConfigLoader::load_from_str(MOCK_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.combo.frame_queue_capacity, 4);

        let (frames, events) = build_sources(&blueprint).unwrap();
        assert!(frames.start());
        assert!(events.start());
        assert!(frames.is_running());
        assert!(events.is_running());
        frames.stop();
        events.stop();
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use contracts::{
        MockSourceConfig, PipelineError, Recorder, SyncTuning, SyncedFrame, SyncedFrameCallback,
    };
    use dispatcher::SessionRecorder;
    use ingestion::{MockEventSource, MockFrameSource};
    use observability::SyncMetricsAggregator;
    use rig::ComboPipeline;

    fn fast_config() -> MockSourceConfig {
        MockSourceConfig {
            frame_rate_hz: 100.0,
            exposure_ms: 4.0,
            event_rate_hz: 20_000.0,
            width: 32,
            height: 32,
        }
    }

    fn build_pipeline(
        recorder: Option<Arc<dyn Recorder>>,
        callback: SyncedFrameCallback,
    ) -> ComboPipeline {
        let config = fast_config();
        let mut builder = ComboPipeline::builder()
            .frame_source(MockFrameSource::new(&config, "mock-rgb-0"))
            .event_source(MockEventSource::new(&config, "mock-dvs-0"))
            .tuning(SyncTuning::default())
            .on_synced_frame(callback);
        if let Some(r) = recorder {
            builder = builder.recorder(r);
        }
        builder.build().unwrap()
    }

    async fn wait_for(counter: &AtomicU64, target: u64, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while counter.load(Ordering::SeqCst) < target && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// End-to-end: mock sources -> synchronizer -> delivery callback
    ///
    /// 验证完整的数据流：
    /// 1. Mock 帧源/事件源产出帧、事件批和触发脉冲
    /// 2. Synchronizer 按曝光窗口配对并切分事件流
    /// 3. DeliveryWorker 将 SyncedFrame 送达回调
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        #[derive(Default)]
        struct Seen {
            frames: Vec<(u64, u64, u64, usize)>, // seq, start, end, events
            unsorted_windows: u64,
            events_past_cut: u64,
        }

        let delivered = Arc::new(AtomicU64::new(0));
        let seen = Arc::new(Mutex::new(Seen::default()));

        let counter = delivered.clone();
        let sink = seen.clone();
        let pipeline = build_pipeline(
            None,
            Arc::new(move |frame: &SyncedFrame| {
                let mut seen = sink.lock().unwrap();
                let events = frame.events.events();
                if events
                    .windows(2)
                    .any(|w| w[0].timestamp_us > w[1].timestamp_us)
                {
                    seen.unsorted_windows += 1;
                }
                if events
                    .iter()
                    .any(|e| e.timestamp_us > frame.exposure_end_us)
                {
                    seen.events_past_cut += 1;
                }
                seen.frames.push((
                    frame.sequence_index,
                    frame.exposure_start_us,
                    frame.exposure_end_us,
                    frame.event_count(),
                ));
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(pipeline.start());
        wait_for(&delivered, 5, Duration::from_secs(5)).await;
        assert!(pipeline.stop());

        let seen = seen.lock().unwrap();
        assert!(
            seen.frames.len() >= 5,
            "expected at least 5 frames, got {}",
            seen.frames.len()
        );
        assert_eq!(seen.unsorted_windows, 0, "event windows must stay sorted");
        assert_eq!(seen.events_past_cut, 0, "no event may cross its cut point");

        // sequence indices strictly increase, windows never overlap
        for pair in seen.frames.windows(2) {
            let (seq_a, _, end_a, _) = pair[0];
            let (seq_b, start_b, end_b, _) = pair[1];
            assert!(seq_b > seq_a, "sequence must strictly increase");
            assert!(start_b >= end_a, "exposure windows must not overlap");
            assert!(end_b >= start_b);
        }

        // steady-state frames carry events (the very first window may be thin)
        assert!(seen.frames.iter().skip(1).any(|&(_, _, _, n)| n > 0));
    }

    /// Recorder failures must not stop delivery to the callback
    #[tokio::test]
    async fn test_recorder_failure_does_not_stop_delivery() {
        struct FailingRecorder;

        impl Recorder for FailingRecorder {
            fn name(&self) -> &str {
                "failing"
            }
            fn is_active(&self) -> bool {
                true
            }
            fn record(&self, _frame: &SyncedFrame) -> Result<(), PipelineError> {
                Err(PipelineError::record("failing", "disk full"))
            }
            fn stop(&self) {}
        }

        let delivered = Arc::new(AtomicU64::new(0));
        let counter = delivered.clone();
        let pipeline = build_pipeline(
            Some(Arc::new(FailingRecorder)),
            Arc::new(move |_: &SyncedFrame| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        pipeline.start();
        wait_for(&delivered, 3, Duration::from_secs(5)).await;
        pipeline.stop();

        let count = delivered.load(Ordering::SeqCst);
        assert!(count >= 3, "callback should keep receiving frames");
        assert!(pipeline.delivery_metrics().record_failures() >= count);
    }

    /// A panicking callback must not take down the delivery thread
    #[tokio::test]
    async fn test_callback_panic_is_isolated() {
        let delivered = Arc::new(AtomicU64::new(0));
        let counter = delivered.clone();
        let pipeline = build_pipeline(
            None,
            Arc::new(move |frame: &SyncedFrame| {
                if frame.sequence_index == 0 {
                    panic!("boom");
                }
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        pipeline.start();
        wait_for(&delivered, 3, Duration::from_secs(5)).await;
        pipeline.stop();

        assert!(delivered.load(Ordering::SeqCst) >= 3);
        assert_eq!(pipeline.delivery_metrics().callback_panics(), 1);
    }

    /// Pipeline survives a stop/start cycle and resumes delivery
    #[tokio::test]
    async fn test_pipeline_restart() {
        let delivered = Arc::new(AtomicU64::new(0));
        let counter = delivered.clone();
        let pipeline = build_pipeline(
            None,
            Arc::new(move |_: &SyncedFrame| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        pipeline.start();
        wait_for(&delivered, 2, Duration::from_secs(5)).await;
        pipeline.stop();
        let after_first_run = delivered.load(Ordering::SeqCst);
        assert!(after_first_run >= 2);

        // queues were cleared, a second run starts fresh
        let depths = pipeline.queue_depths();
        assert_eq!((depths.frames, depths.trigger_pairs, depths.delivery), (0, 0, 0));

        assert!(pipeline.start());
        wait_for(&delivered, after_first_run + 2, Duration::from_secs(5)).await;
        pipeline.stop();

        assert!(delivered.load(Ordering::SeqCst) >= after_first_run + 2);
    }

    /// Session recorder writes a complete on-disk session during a run
    #[tokio::test]
    async fn test_session_recording_e2e() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(SessionRecorder::new(dir.path()).unwrap());
        let session_dir = recorder.session_dir().clone();

        let delivered = Arc::new(AtomicU64::new(0));
        let counter = delivered.clone();
        let pipeline = build_pipeline(
            Some(recorder),
            Arc::new(move |_: &SyncedFrame| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        pipeline.start();
        wait_for(&delivered, 3, Duration::from_secs(5)).await;
        pipeline.stop();

        let csv = std::fs::read_to_string(session_dir.join("frames.csv")).unwrap();
        let rows = csv.lines().count();
        assert!(rows >= 4, "expected header + >=3 rows, got {rows}");

        let manifest = std::fs::read_to_string(session_dir.join("session.json")).unwrap();
        assert!(manifest.contains("\"frames\""));
        assert!(session_dir.join("events.bin").exists());
    }

    /// Aggregator sees no sequence gaps on a clean mock run
    #[tokio::test]
    async fn test_no_sequence_gaps_without_anomalies() {
        let delivered = Arc::new(AtomicU64::new(0));
        let aggregator = Arc::new(Mutex::new(SyncMetricsAggregator::new()));

        let counter = delivered.clone();
        let agg = aggregator.clone();
        let pipeline = build_pipeline(
            None,
            Arc::new(move |frame: &SyncedFrame| {
                agg.lock().unwrap().update(frame);
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        pipeline.start();
        wait_for(&delivered, 5, Duration::from_secs(5)).await;
        pipeline.stop();

        let summary = aggregator.lock().unwrap().summary();
        assert!(summary.total_frames >= 5);
        assert_eq!(summary.sequence_gaps, 0);
        assert!(summary.total_events > 0);
    }
}

#[cfg(test)]
mod anomaly_tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{EventSource, MockSourceConfig};
    use ingestion::{MockAnomalies, MockEventSource};
    use sync_engine::Synchronizer;

    /// Duplicate start pulses produce broken pairs; the synchronizer
    /// discards them and keeps matching the healthy ones.
    #[test]
    fn test_duplicate_starts_are_absorbed() {
        let config = MockSourceConfig {
            frame_rate_hz: 100.0,
            exposure_ms: 4.0,
            event_rate_hz: 10_000.0,
            width: 32,
            height: 32,
        };
        let source = MockEventSource::new(&config, "mock-dvs-0");
        source.set_anomalies(MockAnomalies {
            drop_start_every: None,
            duplicate_start_every: Some(3),
        });

        let matched = Arc::new(AtomicU64::new(0));
        let counter = matched.clone();
        let sync = Synchronizer::new(
            &Default::default(),
            Arc::new(move |_frame| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        {
            let accumulator = sync.accumulator();
            source.set_event_callback(Arc::new(move |batch| {
                accumulator.lock().unwrap().append(batch);
            }));
            let pairer = sync.pairer();
            source.set_trigger_callback(Arc::new(move |signal| {
                pairer.lock().unwrap().add_trigger(signal);
            }));
        }

        sync.start();
        source.start();

        // keep feeding frames so every healthy pair can match
        let frames = sync.frames();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while matched.load(Ordering::SeqCst) < 5 && std::time::Instant::now() < deadline {
            frames.lock().unwrap().push(contracts::FrameImage {
                width: 1,
                height: 1,
                format: contracts::PixelFormat::Mono8,
                data: bytes_one(),
            });
            std::thread::sleep(Duration::from_millis(10));
        }

        source.stop();
        sync.stop();

        assert!(
            matched.load(Ordering::SeqCst) >= 5,
            "healthy pairs must keep matching despite duplicate starts"
        );
    }

    fn bytes_one() -> bytes::Bytes {
        bytes::Bytes::from_static(&[0u8])
    }
}
