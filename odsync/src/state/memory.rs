use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::SyncResult;
use crate::state::base::SyncStateStore;

#[derive(Debug, Default)]
struct Inner {
    deleted: HashSet<String>,
    retry_attempts: HashMap<String, u32>,
}

/// Unbounded in-memory [`SyncStateStore`] living as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemorySyncState {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identifiers recorded as deleted.
    pub async fn deleted_ids(&self) -> HashSet<String> {
        let inner = self.inner.lock().await;
        inner.deleted.clone()
    }

    /// Returns a copy of the retry counters keyed by message body.
    pub async fn retry_counters(&self) -> HashMap<String, u32> {
        let inner = self.inner.lock().await;
        inner.retry_attempts.clone()
    }
}

impl SyncStateStore for MemorySyncState {
    async fn is_deleted(&self, object_id: &str) -> SyncResult<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.deleted.contains(object_id))
    }

    async fn mark_deleted(&self, object_id: &str) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;
        inner.deleted.insert(object_id.to_string());
        Ok(())
    }

    async fn retry_attempts(&self, body: &str) -> SyncResult<Option<u32>> {
        let inner = self.inner.lock().await;
        Ok(inner.retry_attempts.get(body).copied())
    }

    async fn set_retry_attempts(&self, body: &str, attempts: u32) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;
        inner.retry_attempts.insert(body.to_string(), attempts);
        Ok(())
    }
}
