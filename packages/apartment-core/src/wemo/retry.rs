//! Exponential backoff for flaky WeMo state calls.
//!
//! WeMo firmware drops a noticeable share of control requests, so every
//! state read and write goes through [`with_backoff`]. Identity fetches are
//! deliberately not wrapped: discovery skips devices that fail them.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

use crate::wemo::soap::{SoapError, SoapResult};

/// Backoff schedule and budget for retried operations.
///
/// Delays start at `initial_interval_ms`, grow by `multiplier` after every
/// failure and are capped at `max_interval_ms`. No attempt is started once
/// `max_elapsed_ms` has passed; `max_attempts` optionally bounds the attempt
/// count as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Delay before the second attempt (milliseconds).
    pub initial_interval_ms: u64,
    /// Growth factor applied to the delay after each failure.
    pub multiplier: f64,
    /// Upper bound for a single delay (milliseconds).
    pub max_interval_ms: u64,
    /// Total time budget for all attempts (milliseconds).
    pub max_elapsed_ms: u64,
    /// Optional cap on the number of attempts.
    pub max_attempts: Option<u32>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval_ms: 500,
            multiplier: 1.5,
            max_interval_ms: 5_000,
            max_elapsed_ms: 30_000,
            max_attempts: None,
        }
    }
}

impl BackoffPolicy {
    /// Delay before the second attempt.
    #[must_use]
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    /// Upper bound for a single delay.
    #[must_use]
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    /// Total time budget.
    #[must_use]
    pub fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_ms)
    }

    /// Validates the policy values.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_interval_ms == 0 {
            return Err("backoff.initial_interval_ms must be >= 1".to_string());
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err("backoff.multiplier must be a finite value >= 1.0".to_string());
        }
        if self.max_interval_ms < self.initial_interval_ms {
            return Err("backoff.max_interval_ms must be >= initial_interval_ms".to_string());
        }
        if self.max_attempts == Some(0) {
            return Err("backoff.max_attempts must be >= 1 when set".to_string());
        }
        Ok(())
    }

    /// Returns the delay schedule for one retried operation.
    #[must_use]
    pub fn delays(&self) -> BackoffDelays {
        BackoffDelays {
            next: self.initial_interval().min(self.max_interval()),
            multiplier: self.multiplier.max(1.0),
            max: self.max_interval(),
        }
    }
}

/// Non-decreasing delay sequence produced by a [`BackoffPolicy`].
#[derive(Debug, Clone)]
pub struct BackoffDelays {
    next: Duration,
    multiplier: f64,
    max: Duration,
}

impl Iterator for BackoffDelays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        let grown = (current.as_nanos() as f64 * self.multiplier).min(self.max.as_nanos() as f64);
        self.next = Duration::from_nanos(grown as u64).max(current);
        Some(current)
    }
}

/// Errors returned by [`with_backoff`].
#[derive(Debug, Error)]
pub enum RetryError {
    /// Every attempt failed with a transient error until the budget ran out.
    #[error("gave up after {attempts} attempt(s) in {elapsed:?}: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Time spent from the first attempt to giving up.
        elapsed: Duration,
        /// Error of the final attempt.
        #[source]
        last: SoapError,
    },

    /// An attempt failed with an error that retrying will not fix.
    #[error(transparent)]
    Permanent(SoapError),
}

/// Convenient Result alias for retried operations.
pub type RetryResult<T> = Result<T, RetryError>;

/// Runs `operation` with exponential backoff until it succeeds.
///
/// Transient errors are retried according to `policy`; permanent errors
/// (see [`SoapError::is_transient`]) are returned at once. Sleeps only block
/// the calling task.
///
/// # Arguments
/// * `policy` - Backoff schedule and budget
/// * `action` - Action name for logging
/// * `operation` - Closure that performs one attempt
pub async fn with_backoff<T, F, Fut>(
    policy: &BackoffPolicy,
    action: &str,
    mut operation: F,
) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SoapResult<T>>,
{
    let start = Instant::now();
    let max_elapsed = policy.max_elapsed();
    let mut delays = policy.delays();
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        let err = match operation().await {
            Ok(value) => {
                if attempts > 1 {
                    log::info!("[Retry] {} succeeded on attempt {}", action, attempts);
                }
                return Ok(value);
            }
            Err(e) if !e.is_transient() => {
                log::warn!("[Retry] {} failed permanently: {}", action, e);
                return Err(RetryError::Permanent(e));
            }
            Err(e) => e,
        };

        let elapsed = start.elapsed();
        let attempts_left = policy.max_attempts.map_or(true, |max| attempts < max);
        if elapsed >= max_elapsed || !attempts_left {
            log::warn!(
                "[Retry] {} giving up after {} attempt(s) in {:?}: {}",
                action,
                attempts,
                elapsed,
                err
            );
            return Err(RetryError::Exhausted {
                attempts,
                elapsed,
                last: err,
            });
        }

        let delay = delays.next().unwrap_or(policy.max_interval());
        log::info!(
            "[Retry] {} transient error (attempt {}): {}; retrying in {:?}",
            action,
            attempts,
            err,
            delay
        );
        tokio::time::sleep(delay).await;
    }
}
