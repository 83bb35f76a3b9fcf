//! Message queues delivering change-capture batches.

pub mod base;
pub mod memory;
#[cfg(feature = "sqs")]
pub mod sqs;

pub use base::{Queue, QueueMessage};
