use tracing::{debug, error, info, warn};

use crate::error::SyncResult;
use crate::query::QueryBuilder;
use crate::state::SyncStateStore;
use crate::store::Store;
use crate::types::{Action, ChangeCaptureEvent};

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Created,
    /// The insert hit an existing key and the event was applied as an update.
    CreateConvertedToUpdate { rows_affected: u64 },
    Updated,
    /// The object was deleted earlier, the update was dropped without touching the store.
    StaleUpdateDiscarded,
    /// The update matched no row because its create has not landed yet.
    SequencingAnomaly,
    Deleted,
    NothingToDelete,
    /// The action code is unknown.
    Skipped,
}

impl EventOutcome {
    pub fn is_sequencing_anomaly(&self) -> bool {
        matches!(self, EventOutcome::SequencingAnomaly)
    }
}

/// Applies single events, correcting for duplicated and reordered deliveries.
///
/// Every call issues at most two store statements and each statement runs in its own transaction.
/// Errors returned here are fatal for the event: schema drift or a store failure other than a
/// unique violation.
#[derive(Debug, Clone)]
pub struct EventRouter<S, T> {
    builder: QueryBuilder,
    store: S,
    state: T,
}

impl<S, T> EventRouter<S, T> {
    pub fn new(builder: QueryBuilder, store: S, state: T) -> Self {
        Self {
            builder,
            store,
            state,
        }
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, T> EventRouter<S, T>
where
    S: Store + Sync,
    T: SyncStateStore + Sync,
{
    /// Applies `event` according to its action code.
    pub async fn route(&self, event: &ChangeCaptureEvent) -> SyncResult<EventOutcome> {
        match &event.action {
            Action::Create => self.handle_create(event).await,
            Action::Update => self.handle_update(event).await,
            Action::Delete => self.handle_delete(event).await,
            Action::Other(code) => {
                error!(
                    action = %code,
                    object_type = %event.object_type,
                    object_id = %event.object_id,
                    "invalid action, skipping event"
                );
                Ok(EventOutcome::Skipped)
            }
        }
    }

    async fn handle_create(&self, event: &ChangeCaptureEvent) -> SyncResult<EventOutcome> {
        info!(
            object_type = %event.object_type,
            object_id = %event.object_id,
            user_name = %event.user_name,
            "processing create"
        );

        let insert = self.builder.insert(event)?;
        match self.store.execute(&insert).await {
            Ok(_) => Ok(EventOutcome::Created),
            Err(err) if err.is_unique_violation() => {
                warn!(
                    object_type = %event.object_type,
                    object_id = %event.object_id,
                    "object already exists, updating instead"
                );

                let update = self.builder.update(event)?;
                let rows_affected = self.store.execute(&update).await?;

                Ok(EventOutcome::CreateConvertedToUpdate { rows_affected })
            }
            Err(err) => Err(err),
        }
    }

    async fn handle_update(&self, event: &ChangeCaptureEvent) -> SyncResult<EventOutcome> {
        info!(
            object_type = %event.object_type,
            object_id = %event.object_id,
            user_name = %event.user_name,
            "processing update"
        );

        if self.state.is_deleted(&event.object_id).await? {
            info!(object_id = %event.object_id, "object already deleted, discarding update");
            return Ok(EventOutcome::StaleUpdateDiscarded);
        }

        let update = self.builder.update(event)?;
        let rows_affected = self.store.execute(&update).await?;
        if rows_affected == 0 {
            debug!(object_id = %event.object_id, "update matched no row");
            return Ok(EventOutcome::SequencingAnomaly);
        }

        Ok(EventOutcome::Updated)
    }

    async fn handle_delete(&self, event: &ChangeCaptureEvent) -> SyncResult<EventOutcome> {
        info!(
            object_type = %event.object_type,
            object_id = %event.object_id,
            user_name = %event.user_name,
            "processing delete"
        );

        let delete = self.builder.delete(event)?;
        let rows_affected = self.store.execute(&delete).await?;
        if rows_affected == 0 {
            warn!(object_id = %event.object_id, "no matching record found for delete, discarding");
            return Ok(EventOutcome::NothingToDelete);
        }

        self.state.mark_deleted(&event.object_id).await?;

        Ok(EventOutcome::Deleted)
    }
}
