//! # Ingestion
//!
//! Camera data ingestion module.
//!
//! Responsibilities:
//! - Frame capture loop (polls a `FrameSource`, feeds the frame queue)
//! - Ingestion counters
//! - Mock frame/event sources for hardware-free testing
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::CaptureLoop;
//!
//! let capture = CaptureLoop::new(frame_source, poll_timeout, sink, metrics);
//! capture.start();
//! // ... frames flow into the sink callback ...
//! capture.stop();
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::{MockFrameSource, MockEventSource};
//!
//! let frames = MockFrameSource::new(&mock_config, "mock-rgb-0");
//! let events = MockEventSource::new(&mock_config, "mock-dvs-0");
//! ```

mod capture;
mod config;
mod mock;

// Re-exports
pub use capture::{CaptureLoop, FrameSinkFn};
pub use config::{IngestionMetrics, MetricsSnapshot};
pub use mock::{MockAnomalies, MockEventSource, MockFrameSource};
