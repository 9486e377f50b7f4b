//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::SyncMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total synced frames delivered
    pub frames_delivered: u64,

    /// Total frames captured from the frame camera
    pub frames_captured: u64,

    /// Total events ingested from the event camera
    pub events_ingested: u64,

    /// Total trigger pulses received
    pub triggers_ingested: u64,

    /// Recorder write failures
    pub record_failures: u64,

    /// User callback panics caught
    pub callback_panics: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Synced-frame metrics aggregator
    pub sync_metrics: SyncMetricsAggregator,
}

impl PipelineStats {
    /// Calculate delivered frames per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_delivered as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Fraction of captured frames that never reached delivery, as percentage
    #[allow(dead_code)]
    pub fn loss_rate(&self) -> f64 {
        if self.frames_captured > 0 {
            let lost = self.frames_captured.saturating_sub(self.frames_delivered);
            (lost as f64 / self.frames_captured as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Frames delivered: {}", self.frames_delivered);
        println!("   ├─ Frames captured: {}", self.frames_captured);
        println!("   ├─ Events ingested: {}", self.events_ingested);
        println!("   ├─ Trigger pulses: {}", self.triggers_ingested);
        println!("   └─ FPS: {:.2}", self.fps());

        let summary = self.sync_metrics.summary();

        println!("\n📈 Sync Metrics");
        println!("   ├─ Sequence gaps: {}", summary.sequence_gaps);
        println!(
            "   ├─ Empty event windows: {} ({:.2}%)",
            summary.empty_window_frames, summary.empty_window_rate
        );
        println!("   ├─ Events per frame: {}", summary.events_per_frame);
        println!("   └─ Exposure (us): {}", summary.exposure_duration_us);

        if self.record_failures > 0 || self.callback_panics > 0 {
            println!("\n⚠️  Delivery Issues");
            println!("   ├─ Record failures: {}", self.record_failures);
            println!("   └─ Callback panics: {}", self.callback_panics);
        }

        println!();
    }
}
