//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Uses the hardware device clock (microseconds, u64) as primary clock
//! - `sequence_index` is assigned at frame enqueue time, used for ordering/diagnostics

mod blueprint;
mod error;
mod event;
mod frame;
mod recorder;
mod source;
mod synced;
mod trigger;

pub use blueprint::*;
pub use error::*;
pub use event::*;
pub use frame::*;
pub use recorder::{Recorder, SyncedFrameCallback};
pub use source::{EventBatchCallback, EventSource, FrameSource, TriggerCallback};
pub use synced::*;
pub use trigger::*;
