//! Convenient re-exports for common types and traits

pub use crate::core::{Message, Result, ThreadError};
#[cfg(feature = "async")]
pub use crate::queue::NotifyQueue;
pub use crate::queue::BlockingQueue;
pub use crate::thread::{
    available_parallelism, ThreadPriority, WorkerState, WorkerThread, WorkerThreadConfig,
    WorkerThreadStats,
};
