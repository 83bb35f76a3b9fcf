use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::{Instant, timeout_at};
use tracing::debug;
use uuid::Uuid;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::queue::base::{Queue, QueueMessage};

/// Address reported by every [`MemoryQueue`].
pub const MEMORY_QUEUE_URL: &str = "memory://odsync";

#[derive(Debug, Default)]
struct Inner {
    ready: VecDeque<QueueMessage>,
    in_flight: HashMap<String, QueueMessage>,
    acknowledged: Vec<QueueMessage>,
    sent: Vec<String>,
    shut_down: bool,
}

/// In-process [`Queue`] for tests and local development.
///
/// Received messages stay in flight until deleted. There is no visibility timeout, so an
/// unacknowledged message is never redelivered.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueue {
    inner: Arc<Mutex<Inner>>,
    message_available: Arc<Notify>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `body` as if a producer had published it and returns its message id.
    pub async fn push(&self, body: impl Into<String>) -> String {
        let message_id = Uuid::new_v4().to_string();
        let message = QueueMessage {
            message_id: message_id.clone(),
            receipt_handle: String::new(),
            body: body.into(),
        };

        let mut inner = self.inner.lock().await;
        inner.ready.push_back(message);
        drop(inner);

        self.message_available.notify_one();

        message_id
    }

    /// Returns every acknowledged message in acknowledgment order.
    pub async fn acknowledged(&self) -> Vec<QueueMessage> {
        let inner = self.inner.lock().await;
        inner.acknowledged.clone()
    }

    /// Returns the bodies published through [`Queue::send`].
    pub async fn sent(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.sent.clone()
    }

    /// Number of messages waiting to be received.
    pub async fn pending(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.ready.len()
    }

    pub async fn in_flight(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.in_flight.len()
    }

    pub async fn is_shut_down(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.shut_down
    }

    async fn try_take(&self, max_messages: u32) -> Vec<QueueMessage> {
        let mut inner = self.inner.lock().await;

        let mut messages = Vec::new();
        while messages.len() < max_messages as usize {
            let Some(mut message) = inner.ready.pop_front() else {
                break;
            };
            message.receipt_handle = Uuid::new_v4().to_string();
            inner
                .in_flight
                .insert(message.receipt_handle.clone(), message.clone());
            messages.push(message);
        }

        messages
    }
}

impl Queue for MemoryQueue {
    fn url(&self) -> &str {
        MEMORY_QUEUE_URL
    }

    async fn receive(&self, max_messages: u32, wait: Duration) -> SyncResult<Vec<QueueMessage>> {
        let deadline = Instant::now() + wait;

        loop {
            let messages = self.try_take(max_messages).await;
            if !messages.is_empty() {
                return Ok(messages);
            }

            if timeout_at(deadline, self.message_available.notified())
                .await
                .is_err()
            {
                return Ok(Vec::new());
            }
        }
    }

    async fn delete(&self, receipt_handle: &str) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;

        let Some(message) = inner.in_flight.remove(receipt_handle) else {
            bail!(
                ErrorKind::QueueDeleteFailed,
                "Receipt handle is not in flight",
                receipt_handle
            );
        };

        debug!(message_id = %message.message_id, "message acknowledged");
        inner.acknowledged.push(message);

        Ok(())
    }

    async fn send(&self, body: &str) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;
        inner.sent.push(body.to_string());
        drop(inner);

        self.push(body).await;

        Ok(())
    }

    async fn shutdown(&self) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;
        inner.shut_down = true;
        Ok(())
    }
}
