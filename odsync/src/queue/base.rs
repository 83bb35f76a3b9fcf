use std::future::Future;
use std::time::Duration;

use crate::error::SyncResult;

/// A message received from a [`Queue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: String,
    /// Handle used to acknowledge this delivery.
    pub receipt_handle: String,
    pub body: String,
}

/// An at-least-once message queue.
///
/// Delivery order is not guaranteed and a message may be delivered more than once.
pub trait Queue {
    /// Address of the queue, used to label logs and spans.
    fn url(&self) -> &str;

    /// Long-polls for up to `max_messages`, waiting at most `wait` when the queue is empty.
    ///
    /// Returns an empty vector when nothing arrived in time.
    fn receive(
        &self,
        max_messages: u32,
        wait: Duration,
    ) -> impl Future<Output = SyncResult<Vec<QueueMessage>>> + Send;

    /// Acknowledges a delivery, removing the message from the queue.
    fn delete(&self, receipt_handle: &str) -> impl Future<Output = SyncResult<()>> + Send;

    /// Publishes `body` as a new message.
    fn send(&self, body: &str) -> impl Future<Output = SyncResult<()>> + Send;

    /// Releases client resources once the consumer has stopped.
    ///
    /// The default implementation is a no-op.
    fn shutdown(&self) -> impl Future<Output = SyncResult<()>> + Send {
        async { Ok(()) }
    }
}
