use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::apply::batch::{BulkOutcome, apply_bulk_create};
use crate::apply::retry::{RetryDecision, RetryPolicy};
use crate::apply::router::{EventOutcome, EventRouter};
use crate::concurrency::scheduler::RetryScheduler;
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::SyncResult;
use crate::pipeline::SyncEngineConfig;
use crate::queue::{Queue, QueueMessage};
use crate::state::SyncStateStore;
use crate::store::Store;
use crate::types::{ChangeCaptureEvent, is_bulk_create_batch, parse_events};

/// Pause after a failed receive before polling again.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Result of processing one queue message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The body was not a valid event array.
    Malformed,
    /// The bulk-create fast path committed the whole batch.
    Bulk { rows_affected: u64 },
    /// Events were routed one at a time.
    Individual {
        outcomes: Vec<EventOutcome>,
        retry: Option<RetryDecision>,
    },
}

/// Turns one message body into store mutations.
///
/// Never acknowledges anything itself, that is left to [`ConsumerLoop`].
#[derive(Debug)]
pub struct MessageProcessor<S, T> {
    router: EventRouter<S, T>,
    state: T,
    retry_policy: RetryPolicy,
    scheduler: RetryScheduler,
}

impl<S, T> MessageProcessor<S, T>
where
    S: Store + Sync,
    T: SyncStateStore + Clone + Sync,
{
    pub fn new(
        router: EventRouter<S, T>,
        state: T,
        retry_policy: RetryPolicy,
        scheduler: RetryScheduler,
    ) -> Self {
        Self {
            router,
            state,
            retry_policy,
            scheduler,
        }
    }

    /// Processes one message.
    ///
    /// A malformed body is logged and reported as [`MessageOutcome::Malformed`]. An error means
    /// an event failed fatally, events after it in the same message were not applied.
    pub async fn process(&self, message: &QueueMessage) -> SyncResult<MessageOutcome> {
        let events = match parse_events(&message.body) {
            Ok(events) => events,
            Err(err) => {
                error!(
                    message_id = %message.message_id,
                    body = %message.body,
                    error = %err,
                    "error parsing message"
                );
                return Ok(MessageOutcome::Malformed);
            }
        };

        if is_bulk_create_batch(&events) {
            match apply_bulk_create(self.router.builder(), self.router.store(), &events).await? {
                BulkOutcome::Applied { rows_affected } => {
                    return Ok(MessageOutcome::Bulk { rows_affected });
                }
                BulkOutcome::DuplicateKey => {}
            }
        }

        self.process_individually(message, &events).await
    }

    async fn process_individually(
        &self,
        message: &QueueMessage,
        events: &[ChangeCaptureEvent],
    ) -> SyncResult<MessageOutcome> {
        let mut outcomes = Vec::with_capacity(events.len());
        let mut retry = None;

        for event in events {
            let outcome = self.router.route(event).await?;

            // The whole body goes back onto the queue, so one retry covers every anomaly in it.
            if outcome.is_sequencing_anomaly() && retry.is_none() {
                info!(
                    message_id = %message.message_id,
                    object_id = %event.object_id,
                    "update arrived before its create"
                );
                let decision = self
                    .retry_policy
                    .attempt_retry(&message.body, &self.state, &self.scheduler)
                    .await?;
                retry = Some(decision);
            }

            outcomes.push(outcome);
        }

        Ok(MessageOutcome::Individual { outcomes, retry })
    }
}

/// The poll, process and acknowledge loop of the consumer worker.
///
/// Messages are handled strictly one after the other. Shutdown is only observed between polls,
/// a message that has been received is always processed and acknowledged.
#[derive(Debug)]
pub struct ConsumerLoop<S, Q, T> {
    config: Arc<SyncEngineConfig>,
    processor: MessageProcessor<S, T>,
    queue: Q,
    shutdown_rx: ShutdownRx,
}

impl<S, Q, T> ConsumerLoop<S, Q, T>
where
    S: Store + Sync,
    Q: Queue + Sync,
    T: SyncStateStore + Clone + Sync,
{
    pub fn new(
        config: Arc<SyncEngineConfig>,
        processor: MessageProcessor<S, T>,
        queue: Q,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        Self {
            config,
            processor,
            queue,
            shutdown_rx,
        }
    }

    /// Runs until shutdown is signalled or the shutdown sender is dropped.
    pub async fn run(mut self) -> SyncResult<()> {
        info!("starting consumer loop");

        loop {
            let received = tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    info!("shutting down consumer loop");
                    break;
                }

                received = self.queue.receive(self.config.max_messages, self.config.wait_time) => received,
            };

            let messages = match received {
                Ok(messages) => messages,
                Err(err) => {
                    error!(error = %err, "failed to receive messages");
                    if self.backoff().await {
                        break;
                    }
                    continue;
                }
            };

            for message in messages {
                self.handle_message(&message).await;
            }
        }

        Ok(())
    }

    async fn handle_message(&self, message: &QueueMessage) {
        info!(message_id = %message.message_id, "received message");

        match self.processor.process(message).await {
            Ok(outcome) => {
                debug!(message_id = %message.message_id, ?outcome, "message processed");
            }
            Err(err) => {
                error!(
                    message_id = %message.message_id,
                    error = %err,
                    "failed to process message"
                );
            }
        }

        match self.queue.delete(&message.receipt_handle).await {
            Ok(()) => info!(message_id = %message.message_id, "deleted processed message"),
            Err(err) => error!(
                message_id = %message.message_id,
                error = %err,
                "failed to delete message"
            ),
        }
    }

    /// Sleeps after a receive failure. Returns `true` if shutdown was signalled meanwhile.
    async fn backoff(&mut self) -> bool {
        tokio::select! {
            biased;

            _ = self.shutdown_rx.changed() => true,
            _ = tokio::time::sleep(RECEIVE_ERROR_BACKOFF) => false,
        }
    }
}
