use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::apply::consumer::MessageProcessor;
use crate::apply::retry::RetryPolicy;
use crate::apply::router::EventRouter;
use crate::bail;
use crate::concurrency::scheduler::{RetryScheduler, RetrySchedulerHandle};
use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use crate::error::{ErrorKind, SyncResult};
use crate::query::QueryBuilder;
use crate::queue::Queue;
use crate::schema::SchemaCache;
use crate::state::SyncStateStore;
use crate::store::Store;
use crate::workers::consumer::{ConsumerWorker, ConsumerWorkerHandle};

/// Runtime settings of a [`SyncPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEngineConfig {
    /// Schema whose tables are introspected into the schema cache.
    pub schema_owner: String,
    /// Upper bound of messages per receive.
    pub max_messages: u32,
    /// Long-poll wait of a receive.
    pub wait_time: Duration,
    /// Retry ceiling for messages with updates that outran their create.
    pub max_update_attempts: u32,
    /// Delay before a retried message is published again.
    pub retry_delay: Duration,
}

impl SyncEngineConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_update_attempts, self.retry_delay)
    }
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self {
            schema_owner: "public".to_string(),
            max_messages: 1,
            wait_time: Duration::from_secs(10),
            max_update_attempts: 3,
            retry_delay: Duration::from_millis(250),
        }
    }
}

#[derive(Debug)]
enum PipelineState {
    NotStarted,
    Started {
        consumer_worker: ConsumerWorkerHandle,
        retry_scheduler: RetrySchedulerHandle,
    },
}

/// The CDC sync engine: one consumer worker plus its retry scheduler.
///
/// [`SyncPipeline::start`] loads the schema cache and spawns both tasks. Shutdown lets the
/// consumer finish the message it is working on, then waits for the scheduler to publish the
/// retries it still holds and finally releases the queue client.
#[derive(Debug)]
pub struct SyncPipeline<S, Q, T> {
    config: Arc<SyncEngineConfig>,
    store: S,
    queue: Q,
    sync_state: T,
    state: PipelineState,
    shutdown_tx: ShutdownTx,
}

impl<S, Q, T> SyncPipeline<S, Q, T>
where
    S: Store + Clone + Send + Sync + 'static,
    Q: Queue + Clone + Send + Sync + 'static,
    T: SyncStateStore + Clone + Send + Sync + 'static,
{
    pub fn new(config: SyncEngineConfig, store: S, queue: Q, sync_state: T) -> Self {
        // Receivers are created through `subscribe`.
        let (shutdown_tx, _) = create_shutdown_channel();

        Self {
            config: Arc::new(config),
            store,
            queue,
            sync_state,
            state: PipelineState::NotStarted,
            shutdown_tx,
        }
    }

    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Loads the schema cache and spawns the workers.
    ///
    /// Fails without spawning anything when introspection finds no table.
    pub async fn start(&mut self) -> SyncResult<()> {
        if matches!(self.state, PipelineState::Started { .. }) {
            bail!(ErrorKind::InvalidState, "Pipeline was already started");
        }

        info!(
            schema_owner = %self.config.schema_owner,
            queue_url = %self.queue.url(),
            "starting sync pipeline"
        );

        let schema_cache = self.load_schema_cache().await?;

        let (retry_scheduler, retry_scheduler_handle) = RetryScheduler::start(self.queue.clone());

        let router = EventRouter::new(
            QueryBuilder::new(schema_cache),
            self.store.clone(),
            self.sync_state.clone(),
        );
        let processor = MessageProcessor::new(
            router,
            self.sync_state.clone(),
            self.config.retry_policy(),
            retry_scheduler,
        );

        let consumer_worker = ConsumerWorker::new(
            self.config.clone(),
            processor,
            self.queue.clone(),
            self.shutdown_tx.subscribe(),
        )
        .spawn();

        self.state = PipelineState::Started {
            consumer_worker,
            retry_scheduler: retry_scheduler_handle,
        };

        Ok(())
    }

    /// Waits for the consumer, then the retry scheduler, then shuts the queue client down.
    pub async fn wait(self) -> SyncResult<()> {
        let PipelineState::Started {
            consumer_worker,
            retry_scheduler,
        } = self.state
        else {
            info!("pipeline was not started, nothing to wait for");

            return Ok(());
        };

        info!("waiting for consumer worker to complete");

        let mut errors = vec![];

        if let Err(err) = consumer_worker.wait().await {
            errors.push(err);

            info!("consumer worker completed with an error");
        }

        // The scheduler exits once the consumer has dropped its sender.
        info!("waiting for retry scheduler to complete");
        if let Err(err) = retry_scheduler.wait().await {
            errors.push(err);
        }

        if let Err(err) = self.queue.shutdown().await {
            errors.push(err);
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        info!("sync pipeline stopped");

        Ok(())
    }

    pub fn shutdown(&self) {
        info!("trying to shut down the pipeline");

        if let Err(err) = self.shutdown_tx.shutdown() {
            error!("failed to send shutdown signal to the pipeline: {}", err);
            return;
        }

        info!("shut down signal successfully sent to all workers");
    }

    pub async fn shutdown_and_wait(self) -> SyncResult<()> {
        self.shutdown();
        self.wait().await
    }

    async fn load_schema_cache(&self) -> SyncResult<Arc<SchemaCache>> {
        let rows = self.store.load_columns(&self.config.schema_owner).await?;
        let schema_cache = SchemaCache::from_rows(rows)?;

        Ok(Arc::new(schema_cache))
    }
}
