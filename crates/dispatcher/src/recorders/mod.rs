//! Concrete recorder implementations

mod log;
mod session;

pub use log::LogRecorder;
pub use session::SessionRecorder;
