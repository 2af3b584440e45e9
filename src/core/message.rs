//! Message envelope carried by a worker thread's queue

use std::fmt;

/// A queued unit for a [`WorkerThread`](crate::thread::WorkerThread).
///
/// The stop request travels through the same queue as the payloads, so the
/// worker observes it only after every item enqueued before it. Keeping it as
/// its own variant means no payload value can ever be mistaken for it.
pub enum Message<T> {
    /// A payload to hand to the callback
    Item(T),
    /// No further work; the worker thread exits when it dequeues this
    Stop,
}

impl<T> Message<T> {
    /// Returns true if this is the stop marker
    pub fn is_stop(&self) -> bool {
        matches!(self, Message::Stop)
    }

    /// Unwraps the payload, or `None` for the stop marker
    pub fn into_item(self) -> Option<T> {
        match self {
            Message::Item(item) => Some(item),
            Message::Stop => None,
        }
    }
}

impl<T> From<T> for Message<T> {
    fn from(item: T) -> Self {
        Message::Item(item)
    }
}

impl<T> fmt::Debug for Message<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Item(_) => f.write_str("Message::Item(..)"),
            Message::Stop => f.write_str("Message::Stop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_marker() {
        let stop: Message<u32> = Message::Stop;
        assert!(stop.is_stop());
        assert_eq!(stop.into_item(), None);
    }

    #[test]
    fn test_item_is_never_stop() {
        // Values that a "null means stop" scheme would have reserved
        let zero: Message<usize> = 0.into();
        assert!(!zero.is_stop());
        assert_eq!(zero.into_item(), Some(0));

        let none: Message<Option<u8>> = Message::Item(None);
        assert!(!none.is_stop());
    }
}
