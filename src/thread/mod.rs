//! Managed worker thread and the thread-level utilities it relies on

pub mod config;
pub mod parallelism;
pub mod priority;
pub mod stats;
pub mod worker_thread;

pub use config::WorkerThreadConfig;
pub use parallelism::available_parallelism;
pub use priority::{lower_current_thread_priority, ThreadPriority};
pub use stats::WorkerThreadStats;
pub use worker_thread::{WorkerState, WorkerThread};
