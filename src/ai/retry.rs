//! Retry Policy for Transient Failures
//!
//! Exponential backoff over operations that can fail transiently. Only
//! errors classified retryable by `ForgeError::is_retryable` are retried;
//! validation and lookup failures are deterministic and fail fast.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::warn;

use crate::constants;
use crate::types::{ForgeError, Result};

/// Exponential backoff parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub backoff_factor: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: constants::retry::MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(constants::retry::INITIAL_DELAY_MS),
            backoff_factor: constants::retry::BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, initial_delay: Duration, backoff_factor: f32) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_factor,
        }
    }

    fn builder(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_factor(self.backoff_factor)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }

    /// Run `op`, retrying retryable failures with exponential backoff.
    /// The final error is returned unchanged once attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        op.retry(self.builder())
            .when(ForgeError::is_retryable)
            .notify(|err: &ForgeError, delay: Duration| {
                warn!(
                    error = %err,
                    error_type = err.error_type(),
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after transient failure"
                );
            })
            .await
    }
}
