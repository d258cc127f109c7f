//! Retry with jittered exponential backoff
//!
//! Every network-bound operation of the pipeline runs through [`retry`]:
//!
//! | Outcome of an attempt | Action |
//! |-----------------------|--------|
//! | `Ok(value)` | Return `Some(value)` |
//! | not-found error | Return `None` immediately, no sleep |
//! | any other error | Sleep `base * 2^attempt * jitter`, try again |
//! | last attempt fails | Return `RetryExhausted` with the last error |
//!
//! Jitter is drawn uniformly from `[0.9, 1.1)`.

use crate::config::CrawlerConfig;
use crate::FetchError;
use futures::future::BoxFuture;
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

const JITTER_MIN: f64 = 0.9;
const JITTER_MAX: f64 = 1.1;

/// Capability to suspend the calling task for a while
///
/// The pipeline never calls `tokio::time::sleep` directly so that pacing can
/// be observed and shortened.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Sleeper that returns immediately and remembers every requested duration
///
/// Public so that integration tests can drive a real [`Coordinator`] over
/// HTTP without waiting out backoff and batch pauses.
///
/// [`Coordinator`]: crate::crawler::Coordinator
#[doc(hidden)]
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations requested so far, in call order
    pub fn calls(&self) -> Vec<Duration> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(duration);
        }
        Box::pin(futures::future::ready(()))
    }
}

/// Classifies errors for the retrier
pub trait Retryable {
    /// Returns true for the one terminal error kind: the resource does not
    /// exist, so retrying cannot help and the result is simply absent.
    fn is_not_found(&self) -> bool;
}

impl Retryable for FetchError {
    fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// All attempts of an operation failed
#[derive(Debug, Error)]
#[error("{operation} failed after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted<E> {
    /// Name of the operation, for diagnostics
    pub operation: String,

    /// Number of attempts made
    pub attempts: u32,

    /// The error observed on the final attempt
    #[source]
    pub last_error: E,
}

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.retry_count, config.initial_delay())
    }

    /// Delay before the attempt following the zero-based `attempt_index`
    pub fn backoff_delay(&self, attempt_index: u32, jitter: f64) -> Duration {
        let factor = 2f64.powi(attempt_index as i32) * jitter;
        self.base_delay.mul_f64(factor)
    }
}

/// Draws a jitter factor from `[0.9, 1.1)`
pub fn sample_jitter() -> f64 {
    rand::rng().random_range(JITTER_MIN..JITTER_MAX)
}

/// Runs `operation` until it succeeds, reports not-found, or runs out of attempts
///
/// # Arguments
///
/// * `policy` - Attempt count and base delay
/// * `sleeper` - Used for the backoff waits
/// * `operation_name` - Label used in diagnostics
/// * `operation` - Produces a fresh future for every attempt
///
/// # Returns
///
/// * `Ok(Some(value))` - An attempt succeeded
/// * `Ok(None)` - An attempt reported not-found
/// * `Err(RetryExhausted)` - Every attempt failed with a retryable error
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    operation_name: &str,
    mut operation: F,
) -> Result<Option<T>, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(Some(value)),
            Err(error) if error.is_not_found() => {
                tracing::debug!(
                    operation = operation_name,
                    error = %error,
                    "Not found, skipping without retry"
                );
                return Ok(None);
            }
            Err(error) => error,
        };

        attempt += 1;

        if attempt >= max_attempts {
            tracing::warn!(
                operation = operation_name,
                attempt,
                max_attempts,
                error = %error,
                "Attempt failed, no attempts left"
            );
            return Err(RetryExhausted {
                operation: operation_name.to_string(),
                attempts: attempt,
                last_error: error,
            });
        }

        let delay = policy.backoff_delay(attempt - 1, sample_jitter());
        tracing::warn!(
            operation = operation_name,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Attempt failed, backing off"
        );
        sleeper.sleep(delay).await;
    }
}
