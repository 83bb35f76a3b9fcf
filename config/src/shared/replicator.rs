use serde::Deserialize;

use crate::Config;
use crate::shared::{PgConnectionConfig, QueueConfig, SyncConfig, ValidationError};

/// Complete configuration of the replicator service.
///
/// This intentionally does not implement `Serialize` to avoid leaking the store password or
/// the queue secret through a serialized form.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplicatorConfig {
    /// Operational data store receiving the changes.
    pub store: PgConnectionConfig,
    /// Queue delivering change-capture messages.
    pub queue: QueueConfig,
    /// Engine settings.
    pub sync: SyncConfig,
}

impl ReplicatorConfig {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate()?;
        self.queue.validate()?;
        self.sync.validate()
    }
}

impl Config for ReplicatorConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}
