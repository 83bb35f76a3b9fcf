use std::future::Future;

use crate::error::SyncResult;

/// Deduplication and retry bookkeeping of the sync engine.
///
/// The deleted set suppresses stale updates arriving after a delete. Retry counters are keyed by
/// the raw message body, so two messages with identical bodies share one budget. Neither is ever
/// evicted by the engine, which leaves room for bounded or persisted implementations.
pub trait SyncStateStore {
    /// Returns `true` if a delete of `object_id` has been applied.
    fn is_deleted(&self, object_id: &str) -> impl Future<Output = SyncResult<bool>> + Send;

    /// Records that a delete of `object_id` has been applied.
    fn mark_deleted(&self, object_id: &str) -> impl Future<Output = SyncResult<()>> + Send;

    /// Returns the stored attempt count for a message body, if any.
    fn retry_attempts(&self, body: &str) -> impl Future<Output = SyncResult<Option<u32>>> + Send;

    /// Stores the attempt count for a message body.
    fn set_retry_attempts(
        &self,
        body: &str,
        attempts: u32,
    ) -> impl Future<Output = SyncResult<()>> + Send;
}
