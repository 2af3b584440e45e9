//! Configuration for a worker thread

use super::ThreadPriority;
use crate::core::{Result, ThreadError};
use serde::{Deserialize, Serialize};

/// Default OS thread name
pub const DEFAULT_THREAD_NAME: &str = "message-thread";

/// Configuration consulted each time a [`WorkerThread`](super::WorkerThread)
/// spawns its OS thread.
///
/// # Example
///
/// ```rust
/// use message_thread::thread::{ThreadPriority, WorkerThreadConfig};
///
/// let config = WorkerThreadConfig::new("checksum")
///     .low_priority()
///     .with_stack_size(256 * 1024);
///
/// assert_eq!(config.priority, ThreadPriority::Background);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerThreadConfig {
    /// OS thread name
    pub name: String,
    /// Priority the thread requests for itself before processing anything
    pub priority: ThreadPriority,
    /// Stack size in bytes (None = platform default)
    pub stack_size: Option<usize>,
}

impl Default for WorkerThreadConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_THREAD_NAME.to_string(),
            priority: ThreadPriority::Normal,
            stack_size: None,
        }
    }
}

impl WorkerThreadConfig {
    /// Create a configuration with the given thread name
    #[must_use]
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the thread priority
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_priority(mut self, priority: ThreadPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Shorthand for `with_priority(ThreadPriority::Background)`
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn low_priority(self) -> Self {
        self.with_priority(ThreadPriority::Background)
    }

    /// Set the stack size in bytes
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidConfig`] for an empty name, a name with
    /// an interior NUL byte, or a zero stack size.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ThreadError::invalid_config("name", "must not be empty"));
        }
        if self.name.contains('\0') {
            return Err(ThreadError::invalid_config(
                "name",
                "must not contain NUL bytes",
            ));
        }
        if self.stack_size == Some(0) {
            return Err(ThreadError::invalid_config(
                "stack_size",
                "must be non-zero",
            ));
        }
        Ok(())
    }
}
