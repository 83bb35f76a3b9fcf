use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, info};

use crate::apply::consumer::{ConsumerLoop, MessageProcessor};
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::{ErrorKind, SyncResult};
use crate::pipeline::SyncEngineConfig;
use crate::queue::Queue;
use crate::state::SyncStateStore;
use crate::store::Store;
use crate::sync_error;

/// Handle for waiting on the consumer worker.
#[derive(Debug)]
pub struct ConsumerWorkerHandle {
    handle: Option<JoinHandle<SyncResult<()>>>,
}

impl ConsumerWorkerHandle {
    /// Waits for the consumer worker to complete execution.
    ///
    /// A panic or cancellation of the worker task is turned into an error.
    pub async fn wait(mut self) -> SyncResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        handle.await.map_err(|err| {
            if err.is_cancelled() {
                sync_error!(
                    ErrorKind::ConsumerWorkerCancelled,
                    "Consumer worker was cancelled",
                    err
                )
            } else {
                sync_error!(
                    ErrorKind::ConsumerWorkerPanic,
                    "Consumer worker panicked",
                    err
                )
            }
        })??;

        Ok(())
    }
}

/// Worker that drains the queue into the store.
///
/// There is exactly one consumer per pipeline. It owns the [`MessageProcessor`], and with it the
/// retry scheduler sender, so the scheduler winds down once the worker has stopped.
#[derive(Debug)]
pub struct ConsumerWorker<S, Q, T> {
    config: Arc<SyncEngineConfig>,
    processor: MessageProcessor<S, T>,
    queue: Q,
    shutdown_rx: ShutdownRx,
}

impl<S, Q, T> ConsumerWorker<S, Q, T> {
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
}

impl<S, Q, T> ConsumerWorker<S, Q, T>
where
    S: Store + Send + Sync + 'static,
    Q: Queue + Send + Sync + 'static,
    T: SyncStateStore + Clone + Send + Sync + 'static,
{
    /// Spawns the worker on the current runtime.
    pub fn spawn(self) -> ConsumerWorkerHandle {
        info!("starting consumer worker");

        let consumer_worker_span =
            tracing::info_span!("consumer_worker", queue_url = %self.queue.url());
        let consumer_worker = async move {
            ConsumerLoop::new(self.config, self.processor, self.queue, self.shutdown_rx)
                .run()
                .await?;

            info!("consumer worker completed successfully");

            Ok(())
        }
        .instrument(consumer_worker_span.or_current());

        let handle = tokio::spawn(consumer_worker);

        ConsumerWorkerHandle {
            handle: Some(handle),
        }
    }
}
