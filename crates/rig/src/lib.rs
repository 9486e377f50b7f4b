//! # Rig
//!
//! Pipeline assembly module.
//!
//! Responsibilities:
//! - Build camera sources from a `PipelineBlueprint`
//! - Wire sources, queues, loops, recorder, and user callback into a
//!   running `ComboPipeline`
//! - Manage pipeline lifecycle (start/stop ordering, teardown)

pub mod factory;
pub mod pipeline;

pub use contracts::{PipelineBlueprint, SyncedFrameCallback};
pub use factory::build_sources;
pub use pipeline::{ComboPipeline, ComboPipelineBuilder, QueueDepths};
