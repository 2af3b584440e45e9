//! Unbounded blocking FIFO queue built on a mutex and a condition variable.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// A thread-safe, unbounded FIFO queue with blocking and non-blocking removal.
///
/// Pushes never fail and never wait for anything but the lock. [`pop`] parks
/// the caller until an item is available.
///
/// The queue is deliberately not `Clone`: the storage, the lock and the
/// condition variable have exactly one owner. Moving a queue moves all three;
/// `std::mem::take` leaves an empty queue behind.
///
/// # Example
///
/// ```rust
/// use message_thread::queue::BlockingQueue;
///
/// let queue = BlockingQueue::new();
/// queue.push(1);
/// queue.push_multi([2, 3]);
///
/// assert_eq!(queue.pop(), 1);
/// assert_eq!(queue.try_pop(), Some(2));
/// assert_eq!(queue.len(), 1);
/// ```
///
/// [`pop`]: BlockingQueue::pop
pub struct BlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
}

impl<T> BlockingQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }

    /// Appends an item to the back and wakes one waiting consumer.
    pub fn push(&self, item: T) {
        let mut items = self.items.lock();
        items.push_back(item);
        self.not_empty.notify_one();
    }

    /// Appends every item of `batch` in iteration order under a single lock
    /// acquisition, then wakes one waiting consumer.
    ///
    /// No consumer can observe a partially inserted batch, and no item from
    /// another producer can land inside it. The iterator runs to completion
    /// before the lock is taken: if it panics, nothing is queued.
    pub fn push_multi<I>(&self, batch: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut batch: VecDeque<T> = batch.into_iter().collect();
        if batch.is_empty() {
            return;
        }

        let mut items = self.items.lock();
        items.append(&mut batch);
        self.not_empty.notify_one();
    }

    /// Removes and returns the front item, blocking while the queue is empty.
    pub fn pop(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            // Spurious wakeups land back here and re-check.
            self.not_empty.wait(&mut items);
        }
    }

    /// Like [`pop`](BlockingQueue::pop), but gives up after `timeout`.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
            if self.not_empty.wait_until(&mut items, deadline).timed_out() {
                return items.pop_front();
            }
        }
    }

    /// Removes and returns the front item without blocking.
    ///
    /// Returns `None` when the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Removes every queued item in FIFO order under one lock acquisition.
    pub fn drain(&self) -> Vec<T> {
        self.items.lock().drain(..).collect()
    }

    /// Number of queued items.
    ///
    /// Only a snapshot: concurrent producers and the consumer may change it
    /// before the caller acts on it.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns true if no items are queued (snapshot, see [`len`](BlockingQueue::len)).
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingQueue")
            .field("len", &self.len())
            .finish()
    }
}
