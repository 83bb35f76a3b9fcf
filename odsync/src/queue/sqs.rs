use aws_config::BehaviorVersion;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::config::{Credentials, Region};
use config::shared::QueueConfig;
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ErrorKind, SyncResult};
use crate::queue::base::{Queue, QueueMessage};
use crate::sync_error;

/// Provider name attached to statically configured credentials.
const STATIC_CREDENTIALS_PROVIDER: &str = "odsync-static";

/// [`Queue`] backed by Amazon SQS.
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    /// Builds a client for the configured queue.
    ///
    /// Static credentials are used when an access key is configured, otherwise the default
    /// provider chain applies.
    pub async fn new(config: &QueueConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key.expose_secret(),
                None,
                None,
                STATIC_CREDENTIALS_PROVIDER,
            ));
        }

        let sdk_config = loader.load().await;
        info!(queue_url = %config.url, region = %config.region, "sqs client created");

        Self {
            client: Client::new(&sdk_config),
            queue_url: config.url.clone(),
        }
    }
}

impl Queue for SqsQueue {
    fn url(&self) -> &str {
        &self.queue_url
    }

    async fn receive(&self, max_messages: u32, wait: Duration) -> SyncResult<Vec<QueueMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages as i32)
            .wait_time_seconds(wait.as_secs() as i32)
            .send()
            .await
            .map_err(|err| {
                sync_error!(
                    ErrorKind::QueueReceiveFailed,
                    "Failed to receive messages",
                    self.queue_url,
                    source: err
                )
            })?;

        let messages = output
            .messages()
            .iter()
            .filter_map(|message| {
                let receipt_handle = message.receipt_handle()?;
                Some(QueueMessage {
                    message_id: message.message_id().unwrap_or_default().to_string(),
                    receipt_handle: receipt_handle.to_string(),
                    body: message.body().unwrap_or_default().to_string(),
                })
            })
            .collect();

        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &str) -> SyncResult<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|err| {
                sync_error!(
                    ErrorKind::QueueDeleteFailed,
                    "Failed to delete message",
                    self.queue_url,
                    source: err
                )
            })?;

        Ok(())
    }

    async fn send(&self, body: &str) -> SyncResult<()> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|err| {
                sync_error!(
                    ErrorKind::QueueSendFailed,
                    "Failed to publish message",
                    self.queue_url,
                    source: err
                )
            })?;

        debug!(message_id = ?output.message_id(), "message published");

        Ok(())
    }

    async fn shutdown(&self) -> SyncResult<()> {
        // The client owns no background resources, pending requests complete on drop.
        info!(queue_url = %self.queue_url, "sqs queue released");
        Ok(())
    }
}
