//! # Message Thread
//!
//! A blocking message queue and a managed single background worker thread
//! built on top of it.
//!
//! ## Features
//!
//! - **Blocking Queue**: Unbounded FIFO with blocking `pop`, non-blocking
//!   `try_pop` and atomic batch insertion
//! - **Worker Thread**: One lazily spawned OS thread per instance, processing
//!   items serially in enqueue order
//! - **Restartable Lifecycle**: `end()` requests a drain-then-stop; the next
//!   `send` joins the old thread and spawns a new one
//! - **Drain on Drop**: Dropping a worker blocks until every queued item has
//!   been handled, so no thread outlives its owner
//! - **Priority Hints**: Best-effort background priority for worker threads
//! - **Event-Loop Adapter**: Deliver items on a tokio runtime instead of a
//!   dedicated thread (`async` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use message_thread::prelude::*;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let total = Arc::new(AtomicUsize::new(0));
//! let sum = Arc::clone(&total);
//!
//! let worker = WorkerThread::new(move |n: usize| {
//!     sum.fetch_add(n, Ordering::Relaxed);
//! });
//!
//! for i in 1..=10 {
//!     worker.send(i)?;
//! }
//!
//! // Drain and wait for the thread
//! worker.join()?;
//! assert_eq!(total.load(Ordering::Relaxed), 55);
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Priority
//!
//! ```rust
//! use message_thread::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = WorkerThreadConfig::new("indexer").low_priority();
//! let worker = WorkerThread::with_config(config, |path: String| {
//!     let _ = path.len();
//! })?;
//!
//! worker.send("/tmp/a".to_string())?;
//! worker.end();
//! # Ok(())
//! # }
//! ```
//!
//! ## Sizing
//!
//! ```rust
//! use message_thread::prelude::*;
//!
//! let workers: Vec<WorkerThread<u64>> = (0..available_parallelism())
//!     .map(|_| WorkerThread::new(|_: u64| {}))
//!     .collect();
//! assert!(!workers.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod prelude;
pub mod queue;
pub mod thread;

pub use core::{Message, Result, ThreadError};
#[cfg(feature = "async")]
pub use queue::NotifyQueue;
pub use queue::BlockingQueue;
pub use thread::{
    available_parallelism, ThreadPriority, WorkerState, WorkerThread, WorkerThreadConfig,
    WorkerThreadStats,
};
