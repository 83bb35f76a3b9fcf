use std::time::Duration;

use config::shared::{PgConnectionConfig, QueueConfig, ReplicatorConfig, SyncConfig};
use odsync::pipeline::{SyncEngineConfig, SyncPipeline};
use odsync::queue::Queue;
use odsync::queue::sqs::SqsQueue;
use odsync::state::SyncStateStore;
use odsync::state::memory::MemorySyncState;
use odsync::store::Store;
use odsync::store::postgres::PostgresStore;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info, warn};

/// Starts the replicator service with the provided configuration.
///
/// The store pool connects lazily, so connection problems surface when the schema cache is loaded
/// during pipeline start.
pub async fn start_replicator_with_config(
    replicator_config: ReplicatorConfig,
) -> anyhow::Result<()> {
    info!("starting replicator service");

    log_config(&replicator_config);

    let store = PostgresStore::new(
        &replicator_config.store,
        replicator_config.sync.max_connections,
    );
    let queue = SqsQueue::new(&replicator_config.queue).await;
    // Deduplication and retry state lives as long as the process.
    let sync_state = MemorySyncState::new();

    let engine_config = engine_config(&replicator_config.queue, &replicator_config.sync);
    let pipeline = SyncPipeline::new(engine_config, store, queue, sync_state);

    start_pipeline(pipeline).await?;

    info!("replicator service stopped");

    Ok(())
}

fn engine_config(queue: &QueueConfig, sync: &SyncConfig) -> SyncEngineConfig {
    SyncEngineConfig {
        schema_owner: sync.schema_owner.clone(),
        max_messages: queue.max_messages,
        wait_time: Duration::from_secs(queue.wait_time_secs),
        max_update_attempts: sync.max_update_attempts,
        retry_delay: Duration::from_millis(sync.retry_delay_ms),
    }
}

fn log_config(config: &ReplicatorConfig) {
    log_pg_connection_config(&config.store);
    log_queue_config(&config.queue);
    log_sync_config(&config.sync);
}

fn log_pg_connection_config(config: &PgConnectionConfig) {
    debug!(
        host = config.host,
        port = config.port,
        dbname = config.name,
        username = config.username,
        tls_enabled = config.tls.enabled,
        "store connection config",
    );
}

fn log_queue_config(config: &QueueConfig) {
    debug!(
        url = config.url,
        region = config.region,
        endpoint_url = config.endpoint_url.as_deref(),
        static_credentials = config.access_key_id.is_some(),
        wait_time_secs = config.wait_time_secs,
        max_messages = config.max_messages,
        "queue config"
    );
}

fn log_sync_config(config: &SyncConfig) {
    debug!(
        schema_owner = config.schema_owner,
        max_update_attempts = config.max_update_attempts,
        retry_delay_ms = config.retry_delay_ms,
        max_connections = config.max_connections,
        "sync config"
    );
}

/// Starts the pipeline and stops it on SIGTERM or Ctrl+C.
///
/// The message being processed when the signal arrives is finished and acknowledged first.
async fn start_pipeline<S, Q, T>(mut pipeline: SyncPipeline<S, Q, T>) -> anyhow::Result<()>
where
    S: Store + Clone + Send + Sync + 'static,
    Q: Queue + Clone + Send + Sync + 'static,
    T: SyncStateStore + Clone + Send + Sync + 'static,
{
    pipeline.start().await?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let shutdown_tx = pipeline.shutdown_tx();
    let shutdown_handle = tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("sigint (ctrl+c) received, shutting down pipeline");
            }
            _ = sigterm.recv() => {
                info!("sigterm received, shutting down pipeline");
            }
        }

        if let Err(err) = shutdown_tx.shutdown() {
            warn!(error = ?err, "failed to send shutdown signal");
            return;
        }

        info!("pipeline shutdown signal sent");
    });

    let result = pipeline.wait().await;

    // The pipeline may stop on its own, the signal listener is not needed anymore.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    result?;

    Ok(())
}
