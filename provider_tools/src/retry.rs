//! Bounded exponential backoff for outbound calls.
use std::{
    future::Future,
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use backoff::{future::retry, ExponentialBackoffBuilder};
use log::*;

use crate::ProviderApiError;

/// Which failures a call may be retried on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Idempotent reads. Connection failures, timeouts, 429s and 5xx responses are retried.
    Transient,
    /// Writes. Only retried if the request never reached the server.
    ConnectionOnly,
}

impl RetryPolicy {
    fn should_retry(&self, e: &ProviderApiError) -> bool {
        match self {
            RetryPolicy::Transient => e.is_transient(),
            RetryPolicy::ConnectionOnly => e.is_connection_failure(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { attempts: 3, initial_delay: Duration::from_millis(250) }
    }
}

/// Runs `op` until it succeeds, fails with an error `policy` does not retry, or `config.attempts` is used up.
pub async fn with_retries<T, F, Fut>(
    label: &str,
    config: RetryConfig,
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, ProviderApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderApiError>>,
{
    let attempts = config.attempts.max(1);
    let attempt = AtomicU32::new(0);
    let schedule = ExponentialBackoffBuilder::new()
        .with_initial_interval(config.initial_delay)
        .with_multiplier(2.0)
        .with_max_elapsed_time(None)
        .build();
    retry(schedule, || {
        let n = attempt.fetch_add(1, Ordering::SeqCst) + 1;
        let call = op();
        async move {
            match call.await {
                Ok(v) => Ok(v),
                Err(e) if n < attempts && policy.should_retry(&e) => {
                    warn!("{label}: attempt {n} of {attempts} failed. Retrying. {e}");
                    Err(backoff::Error::transient(e))
                },
                Err(e) => {
                    debug!("{label}: attempt {n} of {attempts} failed. Giving up. {e}");
                    Err(backoff::Error::permanent(e))
                },
            }
        }
    })
    .await
}
