use serde::Deserialize;

use crate::shared::ValidationError;

const fn default_max_update_attempts() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    250
}

const fn default_max_connections() -> u32 {
    5
}

/// Settings of the sync engine itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncConfig {
    /// Owner (schema) whose tables are introspected at startup.
    pub schema_owner: String,
    /// Attempts allowed for an update that arrives before its create.
    #[serde(default = "default_max_update_attempts")]
    pub max_update_attempts: u32,
    /// Delay before a retried message is published back onto the queue.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Size of the store connection pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_owner.trim().is_empty() {
            return Err(ValidationError::SchemaOwnerEmpty);
        }

        if self.max_update_attempts == 0 {
            return Err(ValidationError::MaxUpdateAttemptsZero);
        }

        if self.max_connections == 0 {
            return Err(ValidationError::MaxConnectionsZero);
        }

        Ok(())
    }
}
