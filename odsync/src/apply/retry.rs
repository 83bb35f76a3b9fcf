use std::time::Duration;
use tracing::{info, warn};

use crate::concurrency::scheduler::RetryScheduler;
use crate::error::SyncResult;
use crate::state::SyncStateStore;

/// Attempt count assumed for a body that has no stored counter.
const FIRST_ATTEMPT: u32 = 1;

/// What the retry policy did with a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The body was handed to the scheduler. `attempt` is the count before incrementing.
    Scheduled { attempt: u32 },
    /// The ceiling was reached and the body is dropped for good.
    Exhausted { attempts: u32 },
}

/// Bounded re-publish of messages whose updates outran their create.
///
/// Counters are keyed by the raw message body. A body is re-published while its counter is below
/// `max_attempts`, so with the default ceiling of 3 it goes back onto the queue at most twice.
/// The counter of an exhausted body is kept, which turns later identical bodies into no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Schedules `body` for re-publishing or gives up on it.
    pub async fn attempt_retry<T>(
        &self,
        body: &str,
        state: &T,
        scheduler: &RetryScheduler,
    ) -> SyncResult<RetryDecision>
    where
        T: SyncStateStore + Sync,
    {
        let attempt = state.retry_attempts(body).await?.unwrap_or(FIRST_ATTEMPT);

        if attempt >= self.max_attempts {
            warn!(
                attempts = attempt,
                "could not process update message after retries, discarding"
            );
            return Ok(RetryDecision::Exhausted { attempts: attempt });
        }

        info!(attempt, "pushing message back onto the queue");
        scheduler.schedule(body.to_string(), self.delay)?;
        state.set_retry_attempts(body, attempt + 1).await?;

        Ok(RetryDecision::Scheduled { attempt })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250))
    }
}
