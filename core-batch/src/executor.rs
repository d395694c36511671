//! Retrying executor for drained batches.
//!
//! A dispatch is replayed in full while the remote reports a rate limit,
//! either for the whole call or for any single item in it. Every other
//! failure is handed back untouched: per-item errors stay in the reply and a
//! failed dispatch becomes a [`BatchError`] for the collector to fan out.

use bridge_traits::RetryPolicy;
use core_runtime::config::{default_backoff, GalleryConfig};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use crate::error::{BatchError, DispatchError};
use crate::request::{Batch, RawError};
use crate::transport::{BatchTransport, DispatchReply};

pub use core_runtime::config::DEFAULT_MAX_ATTEMPTS;

/// Retry settings for batch dispatches.
///
/// The defaults are the ones [`GalleryConfig`] starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Attempts per dispatch, including the first one
    pub max_attempts: u32,
    /// Delay schedule between rate-limited attempts. Only
    /// [`RetryPolicy::delay_for`] is consulted; its own `max_attempts` is
    /// ignored in favour of the field above.
    pub backoff: RetryPolicy,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: default_backoff(),
        }
    }
}

impl ExecutorConfig {
    /// Retry settings carried by `config`.
    pub fn from_config(config: &GalleryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: config.backoff.clone(),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: RetryPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Dispatches drained batches, retrying rate-limited dispatches.
pub struct RetryingExecutor {
    transport: Arc<dyn BatchTransport>,
    config: ExecutorConfig,
}

impl RetryingExecutor {
    pub fn new(transport: Arc<dyn BatchTransport>, config: ExecutorConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Dispatch `batch`, returning one raw result per correlation key.
    ///
    /// Fails with [`BatchError::RateLimited`] once the retry ceiling is hit.
    #[instrument(skip(self, batch), fields(requests = batch.len()))]
    pub async fn execute(&self, batch: &Batch) -> Result<DispatchReply, BatchError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = self.transport.dispatch(batch.requests()).await;
            let limited = match outcome {
                Ok(reply) => match first_rate_limit(&reply) {
                    None => {
                        debug!(attempt, responses = reply.len(), "Batch dispatched");
                        return Ok(reply);
                    }
                    Some(error) => error,
                },
                Err(DispatchError::Api(error)) if error.is_rate_limit() => error,
                Err(error) => {
                    warn!(attempt, error = %error, "Batch dispatch failed");
                    return Err(error.into());
                }
            };

            if attempt >= max_attempts {
                warn!(
                    attempts = attempt,
                    error = %limited,
                    "Batch still rate limited after final attempt"
                );
                return Err(BatchError::RateLimited(limited));
            }

            let delay = self.config.backoff.delay_for(attempt);
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Batch rate limited, retrying"
            );
            sleep(delay).await;
        }
    }
}

fn first_rate_limit(reply: &DispatchReply) -> Option<RawError> {
    reply
        .values()
        .filter_map(|result| result.as_ref().err())
        .find(|error| error.is_rate_limit())
        .cloned()
}
