//! Camera source construction from blueprint configuration.

use std::sync::Arc;

use contracts::{EventSource, FrameSource, PipelineBlueprint, PipelineError, SourceKind};
use ingestion::{MockEventSource, MockFrameSource};
use tracing::info;

/// Build the frame/event source pair described by the blueprint.
///
/// # Errors
/// `device` sources require vendor SDK bindings that are not wired into
/// this build; requesting one returns `PipelineError::Source`.
pub fn build_sources(
    blueprint: &PipelineBlueprint,
) -> Result<(Arc<dyn FrameSource>, Arc<dyn EventSource>), PipelineError> {
    match blueprint.source.kind {
        SourceKind::Mock => {
            let mock = &blueprint.source.mock;
            info!(
                frame_rate_hz = mock.frame_rate_hz,
                event_rate_hz = mock.event_rate_hz,
                "building mock camera sources"
            );
            let frames: Arc<dyn FrameSource> = MockFrameSource::new(mock, "mock-rgb-0");
            let events: Arc<dyn EventSource> = MockEventSource::new(mock, "mock-dvs-0");
            Ok((frames, events))
        }
        SourceKind::Device => Err(PipelineError::source(
            &blueprint.source.rgb_serial,
            "device sources are not supported in this build",
        )),
    }
}
