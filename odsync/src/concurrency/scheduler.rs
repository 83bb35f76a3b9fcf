use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::time::DelayQueue;
use tracing::{Instrument, debug, error, info};

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::queue::Queue;
use crate::sync_error;

#[derive(Debug)]
struct ScheduledRetry {
    body: String,
    delay: Duration,
}

/// Delays message bodies and publishes them back onto the queue.
///
/// A single background task owns a [`DelayQueue`] and publishes due bodies one at a time, so
/// re-publishing never blocks the consumer. The task only talks to the queue. Once every
/// [`RetryScheduler`] clone is dropped it publishes what is still pending and exits.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    tx: mpsc::UnboundedSender<ScheduledRetry>,
}

/// Handle on the background task of a [`RetryScheduler`].
#[derive(Debug)]
pub struct RetrySchedulerHandle {
    handle: Option<JoinHandle<()>>,
}

impl RetrySchedulerHandle {
    /// Waits for the background task, which finishes once all schedulers are dropped and every
    /// pending retry has been published.
    pub async fn wait(mut self) -> SyncResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        handle.await.map_err(|err| {
            sync_error!(
                ErrorKind::RetrySchedulerPanic,
                "Retry scheduler panicked",
                err
            )
        })
    }
}

impl RetryScheduler {
    /// Starts the background task publishing to `queue`.
    pub fn start<Q>(queue: Q) -> (RetryScheduler, RetrySchedulerHandle)
    where
        Q: Queue + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();

        let span = tracing::info_span!("retry_scheduler");
        let handle = tokio::spawn(run(queue, rx).instrument(span));

        (
            RetryScheduler { tx },
            RetrySchedulerHandle {
                handle: Some(handle),
            },
        )
    }

    /// Publishes `body` after `delay`.
    pub fn schedule(&self, body: String, delay: Duration) -> SyncResult<()> {
        if self.tx.send(ScheduledRetry { body, delay }).is_err() {
            bail!(
                ErrorKind::InvalidState,
                "Retry scheduler is not running"
            );
        }

        Ok(())
    }
}

async fn run<Q: Queue>(queue: Q, mut rx: mpsc::UnboundedReceiver<ScheduledRetry>) {
    info!("starting retry scheduler");

    let mut delayed: DelayQueue<String> = DelayQueue::new();
    let mut accepting = true;

    loop {
        tokio::select! {
            retry = rx.recv(), if accepting => {
                match retry {
                    Some(retry) => {
                        debug!(delay_ms = retry.delay.as_millis() as u64, "retry scheduled");
                        delayed.insert(retry.body, retry.delay);
                    }
                    None => accepting = false,
                }
            }
            Some(expired) = delayed.next(), if !delayed.is_empty() => {
                let body = expired.into_inner();
                if let Err(err) = queue.send(&body).await {
                    error!(error = %err, "failed to re-publish message");
                } else {
                    info!("message re-published for retry");
                }
            }
            else => break,
        }

        if !accepting && delayed.is_empty() {
            break;
        }
    }

    info!("retry scheduler stopped");
}
