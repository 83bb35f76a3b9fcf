use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::time::Instant;

use crate::error::SyncResult;
use crate::queue::{Queue, QueueMessage};
use crate::test_utils::notify::TimedNotify;

/// One recorded queue call with the instant it completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueOperation {
    Received { message: QueueMessage, at: Instant },
    Deleted { receipt_handle: String, at: Instant },
    Sent { body: String, at: Instant },
}

/// Everything that went through a [`TestQueueWrapper`], in call order per kind.
#[derive(Debug, Clone, Default)]
pub struct QueueActivity {
    pub received: Vec<(Instant, QueueMessage)>,
    pub deleted: Vec<(Instant, String)>,
    pub sent: Vec<(Instant, String)>,
}

impl QueueActivity {
    /// Bodies of the messages that were received and then acknowledged, in ack order.
    pub fn acknowledged_bodies(&self) -> Vec<String> {
        self.deleted
            .iter()
            .filter_map(|(_, receipt_handle)| {
                self.received
                    .iter()
                    .find(|(_, message)| &message.receipt_handle == receipt_handle)
                    .map(|(_, message)| message.body.clone())
            })
            .collect()
    }

    /// Gaps between consecutive receipts of `body`.
    pub fn redelivery_gaps(&self, body: &str) -> Vec<Duration> {
        let instants: Vec<Instant> = self
            .received
            .iter()
            .filter(|(_, message)| message.body == body)
            .map(|(at, _)| *at)
            .collect();

        instants
            .windows(2)
            .map(|pair| pair[1].duration_since(pair[0]))
            .collect()
    }
}

type ActivityCondition = Box<dyn Fn(&QueueActivity) -> bool + Send + Sync>;

struct Inner<Q> {
    wrapped_queue: Q,
    activity: QueueActivity,
    conditions: Vec<(ActivityCondition, Arc<Notify>)>,
    shutdown_called: bool,
}

impl<Q> Inner<Q> {
    fn check_conditions(&mut self) {
        let activity = &self.activity;
        self.conditions.retain(|(condition, notify)| {
            let should_retain = !condition(activity);
            if !should_retain {
                notify.notify_one();
            }
            should_retain
        });
    }
}

/// Test wrapper for [`Queue`] implementations that records every call.
///
/// Tests register conditions over the recorded [`QueueActivity`] and await the returned
/// [`TimedNotify`], which fires once the condition holds.
#[derive(Clone)]
pub struct TestQueueWrapper<Q> {
    inner: Arc<RwLock<Inner<Q>>>,
}

impl<Q> fmt::Debug for TestQueueWrapper<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestQueueWrapper").finish_non_exhaustive()
    }
}

impl<Q> TestQueueWrapper<Q> {
    pub fn wrap(queue: Q) -> Self {
        let inner = Inner {
            wrapped_queue: queue,
            activity: QueueActivity::default(),
            conditions: Vec::new(),
            shutdown_called: false,
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    pub async fn activity(&self) -> QueueActivity {
        self.inner.read().await.activity.clone()
    }

    pub async fn shutdown_called(&self) -> bool {
        self.inner.read().await.shutdown_called
    }

    /// Registers a condition over the recorded activity.
    ///
    /// The condition is checked right away and after every recorded call.
    pub async fn notify_on_activity<F>(&self, condition: F) -> TimedNotify
    where
        F: Fn(&QueueActivity) -> bool + Send + Sync + 'static,
    {
        let notify = Arc::new(Notify::new());
        let mut inner = self.inner.write().await;
        inner.conditions.push((Box::new(condition), notify.clone()));

        inner.check_conditions();

        TimedNotify::new(notify)
    }

    /// Fires once `count` messages have been acknowledged.
    pub async fn wait_for_acks(&self, count: usize) -> TimedNotify {
        self.notify_on_activity(move |activity| activity.deleted.len() >= count)
            .await
    }

    async fn record(&self, operation: QueueOperation) {
        let mut inner = self.inner.write().await;
        match operation {
            QueueOperation::Received { message, at } => inner.activity.received.push((at, message)),
            QueueOperation::Deleted { receipt_handle, at } => {
                inner.activity.deleted.push((at, receipt_handle))
            }
            QueueOperation::Sent { body, at } => inner.activity.sent.push((at, body)),
        }

        inner.check_conditions();
    }
}

impl<Q> TestQueueWrapper<Q>
where
    Q: Clone,
{
    async fn wrapped(&self) -> Q {
        self.inner.read().await.wrapped_queue.clone()
    }
}

impl<Q> Queue for TestQueueWrapper<Q>
where
    Q: Queue + Clone + Send + Sync,
{
    fn url(&self) -> &str {
        "test://wrapper"
    }

    async fn receive(&self, max_messages: u32, wait: Duration) -> SyncResult<Vec<QueueMessage>> {
        let messages = self.wrapped().await.receive(max_messages, wait).await?;

        for message in &messages {
            self.record(QueueOperation::Received {
                message: message.clone(),
                at: Instant::now(),
            })
            .await;
        }

        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &str) -> SyncResult<()> {
        self.wrapped().await.delete(receipt_handle).await?;

        self.record(QueueOperation::Deleted {
            receipt_handle: receipt_handle.to_string(),
            at: Instant::now(),
        })
        .await;

        Ok(())
    }

    async fn send(&self, body: &str) -> SyncResult<()> {
        self.wrapped().await.send(body).await?;

        self.record(QueueOperation::Sent {
            body: body.to_string(),
            at: Instant::now(),
        })
        .await;

        Ok(())
    }

    async fn shutdown(&self) -> SyncResult<()> {
        let result = self.wrapped().await.shutdown().await;

        let mut inner = self.inner.write().await;
        inner.shutdown_called = true;

        result
    }
}
