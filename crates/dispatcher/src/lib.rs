//! # Dispatcher
//!
//! 同步帧下发模块。
//!
//! 负责：
//! - 消费 `SyncedFrame` (条件变量门控的单消费者线程)
//! - 录制器落盘 + 用户回调，相互隔离
//! - 归还事件缓冲到池

pub mod metrics;
pub mod queue;
pub mod recorders;
pub mod worker;

pub use contracts::{Recorder, SyncedFrame, SyncedFrameCallback};
pub use metrics::{DeliveryMetrics, DeliverySnapshot};
pub use queue::DeliveryQueue;
pub use recorders::{LogRecorder, SessionRecorder};
pub use worker::DeliveryWorker;
