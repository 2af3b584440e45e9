//! Message queues.
//!
//! - [`BlockingQueue`]: unbounded FIFO with blocking `pop` and non-blocking
//!   `try_pop`; the queue behind every [`WorkerThread`].
//! - [`NotifyQueue`]: the same queue drained on a tokio runtime instead of a
//!   dedicated thread (requires the `async` feature).
//!
//! [`WorkerThread`]: crate::thread::WorkerThread

mod blocking;
#[cfg(feature = "async")]
mod notify;

pub use blocking::BlockingQueue;
#[cfg(feature = "async")]
pub use notify::NotifyQueue;
