//! Single background worker thread fed by a blocking queue

use super::{ThreadPriority, WorkerThreadConfig, WorkerThreadStats};
use crate::core::{Message, Result, ThreadError};
use crate::queue::BlockingQueue;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{span, Level};

type Callback<T> = Box<dyn FnMut(T) + Send>;
type SharedCallback<T> = Arc<Mutex<Option<Callback<T>>>>;

/// Lifecycle of the OS thread behind a [`WorkerThread`], as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No thread, or the last one has been joined
    Idle,
    /// A thread is alive and accepting work
    Running,
    /// A stop was requested; the thread may still be draining and has not
    /// been joined yet
    Stopping,
}

enum ThreadState {
    Idle,
    Running(JoinHandle<()>),
    Stopping(JoinHandle<()>),
    // Handle taken out by a joiner; the state lock is not held across the join.
    Joining,
}

impl ThreadState {
    fn as_worker_state(&self) -> WorkerState {
        match self {
            ThreadState::Idle => WorkerState::Idle,
            ThreadState::Running(_) => WorkerState::Running,
            ThreadState::Stopping(_) | ThreadState::Joining => WorkerState::Stopping,
        }
    }
}

/// Owns one queue and at most one OS thread that feeds every queued item,
/// in order, to a single callback.
///
/// The thread is spawned lazily by the first [`send`](WorkerThread::send) or
/// [`start`](WorkerThread::start). [`end`](WorkerThread::end) enqueues a stop
/// marker and returns at once; the thread keeps draining until it reaches the
/// marker. A later `send` joins that old thread and spawns a fresh one.
/// Dropping the `WorkerThread` requests a stop and blocks until every
/// previously queued item has been handled.
///
/// All methods except the priority setters take `&self`, so an instance can be
/// shared between producers behind an `Arc`.
///
/// The callback may call [`state`](WorkerThread::state),
/// [`is_running`](WorkerThread::is_running), [`len`](WorkerThread::len),
/// [`end`](WorkerThread::end) or `{:?}` on its own worker at any time. It must
/// not call `start`, `send`, `send_multi` or `join` on it while another thread
/// is restarting or joining that worker: the join waits for the callback and
/// the callback would wait for the join.
///
/// # Example
///
/// ```rust
/// use message_thread::prelude::*;
/// use std::sync::mpsc;
///
/// # fn main() -> Result<()> {
/// let (tx, rx) = mpsc::channel();
/// let worker = WorkerThread::new(move |n: u32| tx.send(n * 2).unwrap());
///
/// worker.send(1)?;
/// worker.send_multi(vec![2, 3])?;
/// drop(worker); // drains, then joins
///
/// assert_eq!(rx.iter().collect::<Vec<_>>(), vec![2, 4, 6]);
/// # Ok(())
/// # }
/// ```
pub struct WorkerThread<T: Send + 'static> {
    queue: Arc<BlockingQueue<Message<T>>>,
    // Serializes start / send / join; never taken by read-only accessors or end().
    lifecycle: Mutex<()>,
    state: Mutex<ThreadState>,
    callback: SharedCallback<T>,
    config: WorkerThreadConfig,
    stats: Arc<WorkerThreadStats>,
}

impl<T: Send + 'static> WorkerThread<T> {
    /// Create an idle worker thread with the default configuration
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        Self::build(WorkerThreadConfig::default(), Some(Box::new(callback)))
    }

    /// Create an idle worker thread with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidConfig`] if the configuration is invalid.
    pub fn with_config<F>(config: WorkerThreadConfig, callback: F) -> Result<Self>
    where
        F: FnMut(T) + Send + 'static,
    {
        config.validate()?;
        Ok(Self::build(config, Some(Box::new(callback))))
    }

    /// Create an idle worker thread with no callback yet.
    ///
    /// Items that reach the thread before [`set_callback`](WorkerThread::set_callback)
    /// are dropped and counted as skipped.
    pub fn without_callback() -> Self {
        Self::build(WorkerThreadConfig::default(), None)
    }

    fn build(config: WorkerThreadConfig, callback: Option<Callback<T>>) -> Self {
        Self {
            queue: Arc::new(BlockingQueue::new()),
            lifecycle: Mutex::new(()),
            state: Mutex::new(ThreadState::Idle),
            callback: Arc::new(Mutex::new(callback)),
            config,
            stats: Arc::new(WorkerThreadStats::new()),
        }
    }

    /// Register the procedure invoked once per item.
    ///
    /// Takes effect from the next item the thread dequeues. Must not be called
    /// from inside the callback itself.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: FnMut(T) + Send + 'static,
    {
        *self.callback.lock() = Some(Box::new(callback));
    }

    /// Set the priority the next spawned thread requests for itself.
    pub fn set_priority(&mut self, priority: ThreadPriority) {
        self.config.priority = priority;
    }

    /// `true` selects [`ThreadPriority::Background`] for the next spawn.
    pub fn set_low_priority(&mut self, low_priority: bool) {
        self.set_priority(low_priority.into());
    }

    /// Spawn the worker thread unless one is already running.
    ///
    /// A thread left over from an earlier [`end`](WorkerThread::end) is joined
    /// first, which blocks until it has drained its queue.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::SpawnError`] if the OS cannot create a thread.
    /// The instance stays idle.
    pub fn start(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock();
        self.ensure_running()
    }

    /// Queue one item, starting the thread if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::SpawnError`] if a thread had to be started and
    /// could not be; the item is dropped.
    pub fn send(&self, item: T) -> Result<()> {
        self.enqueue(|queue| queue.push(Message::Item(item)))
    }

    /// Queue a batch of items atomically, starting the thread if needed.
    ///
    /// The batch is delivered as one contiguous run; items from other
    /// producers never land inside it. The iterator is consumed before any
    /// lock is taken, so a panicking iterator queues nothing.
    ///
    /// # Errors
    ///
    /// Same as [`send`](WorkerThread::send).
    pub fn send_multi<I>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let batch: Vec<Message<T>> = items.into_iter().map(Message::Item).collect();
        self.enqueue(|queue| queue.push_multi(batch))
    }

    /// Request a graceful stop without waiting for it.
    ///
    /// Items already queued are still delivered. No-op unless running.
    pub fn end(&self) {
        let mut state = self.state.lock();
        *state = match mem::replace(&mut *state, ThreadState::Idle) {
            ThreadState::Running(handle) => {
                self.queue.push(Message::Stop);
                ThreadState::Stopping(handle)
            }
            other => other,
        };
    }

    /// Request a stop and block until the thread has drained and exited.
    ///
    /// The instance is idle afterwards and can be started again.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::JoinError`] if the thread terminated by panic.
    pub fn join(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock();
        self.end();
        let handle = {
            let mut state = self.state.lock();
            match mem::replace(&mut *state, ThreadState::Idle) {
                ThreadState::Stopping(handle) => {
                    *state = ThreadState::Joining;
                    handle
                }
                other => {
                    *state = other;
                    return Ok(());
                }
            }
        };

        let result = join_thread(&self.config.name, handle);
        *self.state.lock() = ThreadState::Idle;
        result
    }

    /// Current lifecycle state
    pub fn state(&self) -> WorkerState {
        self.state.lock().as_worker_state()
    }

    /// Returns true if a thread is running and accepting work
    pub fn is_running(&self) -> bool {
        self.state() == WorkerState::Running
    }

    /// Number of queued entries not yet picked up by the thread (snapshot).
    ///
    /// A pending stop marker counts as an entry.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if nothing is queued (snapshot)
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// OS thread name used for every spawn
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Active configuration
    pub fn config(&self) -> &WorkerThreadConfig {
        &self.config
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerThreadStats> {
        Arc::clone(&self.stats)
    }

    /// Starts the thread if needed and runs `push` while it is known to be
    /// running, so no item can land behind a stop marker.
    fn enqueue<F>(&self, push: F) -> Result<()>
    where
        F: FnOnce(&BlockingQueue<Message<T>>),
    {
        let _lifecycle = self.lifecycle.lock();
        loop {
            self.ensure_running()?;
            let state = self.state.lock();
            // end() may have slipped in between the start and this check.
            if matches!(*state, ThreadState::Running(_)) {
                push(&self.queue);
                return Ok(());
            }
        }
    }

    /// Caller must hold the lifecycle lock.
    fn ensure_running(&self) -> Result<()> {
        let previous = {
            let mut state = self.state.lock();
            match mem::replace(&mut *state, ThreadState::Idle) {
                ThreadState::Running(handle) => {
                    *state = ThreadState::Running(handle);
                    return Ok(());
                }
                ThreadState::Stopping(handle) => {
                    *state = ThreadState::Joining;
                    Some(handle)
                }
                ThreadState::Idle | ThreadState::Joining => None,
            }
        };

        if let Some(handle) = previous {
            // Reclaim the previous thread before replacing it.
            if let Err(e) = join_thread(&self.config.name, handle) {
                log::warn!("{}", e);
            }
        }

        let spawned = self.spawn();
        let mut state = self.state.lock();
        match spawned {
            Ok(handle) => {
                *state = ThreadState::Running(handle);
                Ok(())
            }
            Err(e) => {
                *state = ThreadState::Idle;
                Err(e)
            }
        }
    }

    fn spawn(&self) -> Result<JoinHandle<()>> {
        let name = self.config.name.clone();
        let priority = self.config.priority;
        let queue = Arc::clone(&self.queue);
        let callback = Arc::clone(&self.callback);
        let stats = Arc::clone(&self.stats);

        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        let handle = builder
            .spawn(move || run(&name, priority, &queue, &callback, &stats))
            .map_err(|e| {
                ThreadError::spawn_with_source(&self.config.name, "Cannot create thread", e)
            })?;

        self.stats.increment_spawned();
        log::debug!(
            "spawned worker thread '{}' (priority {:?})",
            self.config.name,
            priority
        );
        Ok(handle)
    }
}

impl<T: Send + 'static> Default for WorkerThread<T> {
    fn default() -> Self {
        Self::without_callback()
    }
}

impl<T: Send + 'static> Drop for WorkerThread<T> {
    fn drop(&mut self) {
        self.end();
        if let ThreadState::Stopping(handle) = mem::replace(self.state.get_mut(), ThreadState::Idle)
        {
            if let Err(e) = join_thread(&self.config.name, handle) {
                log::error!("{} during drop", e);
            }
        }
    }
}

impl<T: Send + 'static> fmt::Debug for WorkerThread<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerThread")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("queued", &self.queue.len())
            .finish()
    }
}

/// Processing loop executed on the worker thread
fn run<T>(
    name: &str,
    priority: ThreadPriority,
    queue: &BlockingQueue<Message<T>>,
    callback: &Mutex<Option<Callback<T>>>,
    stats: &WorkerThreadStats,
) {
    #[cfg(feature = "tracing")]
    let worker_span = span!(Level::DEBUG, "message_thread", name = name);
    #[cfg(feature = "tracing")]
    let _guard = worker_span.enter();

    priority.apply();

    #[cfg(feature = "tracing")]
    tracing::debug!(priority = ?priority, "worker started");

    loop {
        match queue.pop() {
            Message::Item(item) => process(name, item, callback, stats),
            Message::Stop => break,
        }
    }

    log::debug!(
        "worker thread '{}' exiting after {} items",
        name,
        stats.get_items_processed()
    );
}

/// Hand one item to the callback with panic protection
fn process<T>(
    name: &str,
    item: T,
    callback: &Mutex<Option<Callback<T>>>,
    stats: &WorkerThreadStats,
) {
    let mut slot = callback.lock();
    let Some(cb) = slot.as_mut() else {
        log::warn!("worker thread '{}': no callback registered, item dropped", name);
        stats.increment_skipped();
        return;
    };

    let start = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| cb(item)));
    stats.add_processing_time(start.elapsed().as_micros() as u64);

    match outcome {
        Ok(()) => stats.increment_processed(),
        Err(panic_info) => {
            log::error!(
                "worker thread '{}': callback panicked: {}",
                name,
                panic_message(panic_info.as_ref())
            );
            stats.increment_panicked();
        }
    }
}

fn join_thread(name: &str, handle: JoinHandle<()>) -> Result<()> {
    handle
        .join()
        .map_err(|panic_info| ThreadError::join(name, panic_message(panic_info.as_ref())))?;
    log::debug!("joined worker thread '{}'", name);
    Ok(())
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
