use secrecy::SecretString;
use serde::Deserialize;

use crate::shared::ValidationError;

/// Largest batch a single receive call may request.
const MAX_RECEIVE_BATCH: u32 = 10;

/// Longest long-poll wait the queue accepts, in seconds.
const MAX_WAIT_TIME_SECS: u64 = 20;

const fn default_wait_time_secs() -> u64 {
    10
}

const fn default_max_messages() -> u32 {
    1
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Settings of the queue carrying change-capture messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueueConfig {
    /// Url of the queue, used for receive, delete and re-publish.
    pub url: String,
    /// Region hosting the queue.
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override, e.g. a local emulator.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Static access key. When absent the default credential chain is used.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret paired with [`QueueConfig::access_key_id`].
    #[serde(default)]
    pub secret_access_key: Option<SecretString>,
    /// Long-poll wait per receive call.
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,
    /// Messages requested per receive call.
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,
}

impl QueueConfig {
    /// Validates the queue settings against the limits of the queue service.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::QueueUrlEmpty);
        }

        if self.max_messages == 0 || self.max_messages > MAX_RECEIVE_BATCH {
            return Err(ValidationError::MaxMessagesOutOfRange(self.max_messages));
        }

        if self.wait_time_secs > MAX_WAIT_TIME_SECS {
            return Err(ValidationError::WaitTimeOutOfRange(self.wait_time_secs));
        }

        if self.access_key_id.is_some() && self.secret_access_key.is_none() {
            return Err(ValidationError::MissingSecretAccessKey);
        }

        Ok(())
    }
}
