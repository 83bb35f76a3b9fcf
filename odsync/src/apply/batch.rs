use tracing::{info, warn};

use crate::error::SyncResult;
use crate::query::{QueryBuilder, Statement};
use crate::store::Store;
use crate::types::ChangeCaptureEvent;

/// Result of the bulk-create fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOutcome {
    /// Every create was committed in one transaction.
    Applied { rows_affected: u64 },
    /// A create hit an existing key, nothing was committed.
    DuplicateKey,
}

/// Inserts every event of a bulk-create batch as one unit of work.
///
/// A unique violation rolls the whole batch back and is reported as
/// [`BulkOutcome::DuplicateKey`] so the caller can fall back to per-event handling. Any other
/// failure is returned as is.
pub async fn apply_bulk_create<S>(
    builder: &QueryBuilder,
    store: &S,
    events: &[ChangeCaptureEvent],
) -> SyncResult<BulkOutcome>
where
    S: Store + Sync,
{
    info!(events = events.len(), "processing bulk create");

    let statements = events
        .iter()
        .map(|event| builder.insert(event))
        .collect::<SyncResult<Vec<Statement>>>()?;

    match store.execute_batch(&statements).await {
        Ok(rows_affected) => Ok(BulkOutcome::Applied { rows_affected }),
        Err(err) if err.is_unique_violation() => {
            warn!(
                error = %err,
                "duplicate key in bulk create, batch will be processed individually"
            );
            Ok(BulkOutcome::DuplicateKey)
        }
        Err(err) => Err(err),
    }
}
