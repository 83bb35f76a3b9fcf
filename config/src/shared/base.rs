use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// The queue url is empty.
    #[error("`queue.url` cannot be empty")]
    QueueUrlEmpty,
    /// The number of messages per poll is outside what the queue accepts.
    #[error("`queue.max_messages` must be between 1 and 10, got {0}")]
    MaxMessagesOutOfRange(u32),
    /// The long-poll wait exceeds what the queue accepts.
    #[error("`queue.wait_time_secs` cannot exceed 20, got {0}")]
    WaitTimeOutOfRange(u64),
    /// An access key was configured without its secret.
    #[error("`queue.secret_access_key` must be set when `queue.access_key_id` is set")]
    MissingSecretAccessKey,
    /// The schema owner used for introspection is empty.
    #[error("`sync.schema_owner` cannot be empty")]
    SchemaOwnerEmpty,
    /// The update retry ceiling cannot be zero.
    #[error("`sync.max_update_attempts` cannot be zero")]
    MaxUpdateAttemptsZero,
    /// The store connection pool needs at least one connection.
    #[error("`sync.max_connections` cannot be zero")]
    MaxConnectionsZero,
}
