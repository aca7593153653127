//! Bounded exponential backoff around fallible async operations
//!
//! Failures are classified through the [`Classify`] trait:
//!
//! | Class | Examples | Action |
//! |-------|----------|--------|
//! | `Client` | HTTP 4xx | Fail immediately, no sleep |
//! | `Transient` | HTTP 5xx, timeout, connection error, selector wait timeout | Retry |
//! | `Unclassified` | anything else | Retry |
//!
//! The delay before retry `a` (0-based) is
//! `min(initial_delay * backoff_factor^a, max_delay)`.

use crate::config::RetryConfig;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How a failure should be treated by the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The request itself is wrong; retrying cannot help
    Client,
    /// Likely to succeed later
    Transient,
    /// Unknown cause; retried
    Unclassified,
}

/// Errors that can tell the retry loop what kind of failure they are
pub trait Classify {
    fn classify(&self) -> FailureClass;
}

/// Why a retried operation finally failed
#[derive(Debug, Error)]
pub enum RetryError<E: std::error::Error + 'static> {
    #[error("non-retryable failure: {0}")]
    NonRetryable(#[source] E),

    #[error("failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: E,
    },

    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

/// Retry configuration and driver
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 2.0,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Backoff before the retry that follows failed attempt `attempt` (0-based)
    ///
    /// # Examples
    ///
    /// ```
    /// use price_sentinel::retry::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay_for(0), Duration::from_secs(1));
    /// assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    /// assert_eq!(policy.delay_for(10), Duration::from_secs(60));
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs.max(0.0))
        }
    }

    /// Decides whether failed attempt `attempt` should be followed by another
    pub fn should_retry<E: Classify>(&self, err: &E, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        match err.classify() {
            FailureClass::Client => false,
            FailureClass::Transient | FailureClass::Unclassified => true,
        }
    }

    /// Runs `op` until it succeeds, fails permanently, or the budget is spent
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The first successful result
    /// * `Err(RetryError::NonRetryable)` - A client failure, returned without sleeping
    /// * `Err(RetryError::Exhausted)` - The attempt numbered `max_retries` failed,
    ///   whatever its class
    pub async fn execute_with_retry<T, E, F, Fut>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::error::Error + 'static,
    {
        // A token nobody cancels never resolves its `cancelled()` future
        self.execute_with_retry_cancellable(op, &CancellationToken::new())
            .await
    }

    /// Like [`execute_with_retry`](Self::execute_with_retry), observing `cancel`
    ///
    /// Cancellation is checked while an attempt runs and during each backoff
    /// sleep. A backoff that is cut short does not count as an attempt.
    pub async fn execute_with_retry_cancellable<T, E, F, Fut>(
        &self,
        mut op: F,
        cancel: &CancellationToken,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::error::Error + 'static,
    {
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled { attempts: attempt });
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled { attempts: attempt });
                }
                outcome = op() => outcome,
            };

            let err = match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        info!(
                            attempt = attempt + 1,
                            total = self.max_retries + 1,
                            "Succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            // The budget is checked before the class: a client error on the
            // last allowed attempt reports exhaustion
            if attempt >= self.max_retries {
                error!(
                    attempts = attempt + 1,
                    error = %err,
                    "Giving up after exhausting retries"
                );
                return Err(RetryError::Exhausted {
                    attempts: attempt + 1,
                    last: err,
                });
            }
            if !self.should_retry(&err, attempt) {
                debug!(error = %err, "Not retrying client error");
                return Err(RetryError::NonRetryable(err));
            }

            let delay = self.delay_for(attempt);
            warn!(
                attempt = attempt + 1,
                total = self.max_retries + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Attempt failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled { attempts: attempt + 1 });
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}
