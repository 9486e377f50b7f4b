//! # Sync Engine
//!
//! 帧相机 / 事件相机硬件同步引擎。
//!
//! 负责：
//! - 触发脉冲配对 (Start/End -> TriggerPair)
//! - 有界帧队列与事件累积
//! - 按曝光窗口精确切分事件流
//! - 输出 `SyncedFrame`
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::Synchronizer;
//!
//! let sync = Synchronizer::new(&tuning, move |frame| {
//!     // Handle synchronized frame
//! });
//!
//! sync.pairer().lock().unwrap().add_trigger(signal);
//! sync.frames().lock().unwrap().push(image);
//! sync.start();
//! ```

mod accumulator;
mod engine;
mod frame_queue;
mod pool;
mod trigger;

pub use accumulator::EventAccumulator;
pub use engine::Synchronizer;
pub use frame_queue::FrameQueue;
pub use pool::EventBufferPool;
pub use trigger::TriggerPairer;

// Re-export contracts types
pub use contracts::{Event, FrameRecord, PooledEventBuffer, SyncTuning, SyncedFrame, TriggerPair};
