//! Core types shared by the queue and thread modules

pub mod error;
pub mod message;

pub use error::{Result, ThreadError};
pub use message::Message;
