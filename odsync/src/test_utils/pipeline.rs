use std::time::Duration;

use crate::pipeline::{SyncEngineConfig, SyncPipeline};
use crate::queue::Queue;
use crate::state::SyncStateStore;
use crate::store::Store;

/// Engine settings for tests: default retry policy with a short long-poll wait.
pub fn test_engine_config() -> SyncEngineConfig {
    SyncEngineConfig {
        wait_time: Duration::from_millis(200),
        ..SyncEngineConfig::default()
    }
}

pub fn create_pipeline<S, Q, T>(store: S, queue: Q, sync_state: T) -> SyncPipeline<S, Q, T>
where
    S: Store + Clone + Send + Sync + 'static,
    Q: Queue + Clone + Send + Sync + 'static,
    T: SyncStateStore + Clone + Send + Sync + 'static,
{
    SyncPipeline::new(test_engine_config(), store, queue, sync_state)
}
