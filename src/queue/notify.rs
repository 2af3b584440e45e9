//! Event-loop notification queue.
//!
//! Instead of a dedicated OS thread, a [`NotifyQueue`] parks a drain task on a
//! host tokio runtime. Producers on any thread call [`NotifyQueue::notify`];
//! the callback runs on the runtime's own thread.

use super::BlockingQueue;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Delivers items pushed from arbitrary threads to a callback on a tokio runtime.
///
/// Each wake-up drains every item available at that moment, one callback call
/// per item, in FIFO order. Wake-ups coalesce: several `notify` calls before
/// the task runs result in a single drain pass.
///
/// # Example
///
/// ```rust,ignore
/// use message_thread::queue::NotifyQueue;
///
/// let queue = NotifyQueue::new(&tokio::runtime::Handle::current(), |line: String| {
///     println!("{}", line);
/// });
/// queue.notify("hello".to_string());
/// queue.close_with((), |_| println!("closed"));
/// ```
pub struct NotifyQueue<T> {
    queue: Arc<BlockingQueue<T>>,
    wake: Arc<Notify>,
    closed: Arc<AtomicBool>,
    runtime: Handle,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> NotifyQueue<T> {
    /// Registers the wake handle and drain task on `runtime`.
    pub fn new<F>(runtime: &Handle, mut callback: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let queue = Arc::new(BlockingQueue::new());
        let wake = Arc::new(Notify::new());
        let closed = Arc::new(AtomicBool::new(false));

        let task = {
            let queue = Arc::clone(&queue);
            let wake = Arc::clone(&wake);
            let closed = Arc::clone(&closed);
            runtime.spawn(async move {
                loop {
                    wake.notified().await;
                    if closed.load(Ordering::Acquire) {
                        break;
                    }
                    while let Some(item) = queue.try_pop() {
                        callback(item);
                    }
                }
                log::debug!("notify queue unregistered ({} items dropped)", queue.len());
            })
        };

        Self {
            queue,
            wake,
            closed,
            runtime: runtime.clone(),
            task: Some(task),
        }
    }

    /// Queues `item` and wakes the drain task. Never blocks.
    pub fn notify(&self, item: T) {
        self.queue.push(item);
        self.wake.notify_one();
    }

    /// Number of items not yet delivered (snapshot).
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if every notified item has been handed to the callback.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Unregisters the wake handle. Once the drain task has finished,
    /// `on_closed(data)` runs exactly once on the runtime.
    ///
    /// Items still queued when the task observes the close are dropped
    /// without reaching the callback.
    pub fn close_with<D, F>(mut self, data: D, on_closed: F)
    where
        D: Send + 'static,
        F: FnOnce(D) + Send + 'static,
    {
        if let Some(task) = self.unregister() {
            self.runtime.spawn(async move {
                if let Err(e) = task.await {
                    log::error!("notify queue drain task failed: {}", e);
                }
                on_closed(data);
            });
        }
    }

    /// Unregisters the wake handle without a completion notification.
    pub fn close(mut self) {
        self.unregister();
    }
}

impl<T> NotifyQueue<T> {
    fn unregister(&mut self) -> Option<JoinHandle<()>> {
        let task = self.task.take()?;
        self.closed.store(true, Ordering::Release);
        self.wake.notify_one();
        Some(task)
    }
}

impl<T> Drop for NotifyQueue<T> {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl<T> fmt::Debug for NotifyQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyQueue")
            .field("len", &self.queue.len())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}
