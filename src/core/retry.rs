//! Backoff Retrier
//!
//! Wraps one outbound call in an exponential backoff loop:
//! 1s → 2s → 4s → ... capped at `max_delay`, optional ±jitter.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Attempting ──ok──────────────────────────────▶ Succeeded
//!     │ retryable error, budget left
//!     ▼
//!  Backoff ──sleep──▶ Attempting (attempt + 1)
//!     │ retryable error, budget spent
//!     ▼
//!  Exhausted ──▶ Err(MaxRetriesExceeded)
//! ```
//!
//! Non-retryable errors (`BadResponse`, `MissingField`) leave the machine
//! immediately with their own code. `RateLimited` shares the attempt budget
//! with `ConnectivityFailure`; if the policy has a fixed `rate_limit_pause`
//! that pause is used instead of the backoff delay.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::MAX_RETRY_DELAY_MS;

/// Attempt budget and delay schedule for one kind of request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled after every backoff
    pub initial_delay: Duration,
    /// Ceiling for the doubled delay
    pub max_delay: Duration,
    /// Random jitter applied to each backoff, in percent of the delay
    pub jitter_percent: u64,
    /// Fixed pause after a rate-limit signal (None = use backoff delay)
    pub rate_limit_pause: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_millis(MAX_RETRY_DELAY_MS),
            jitter_percent: 0,
            rate_limit_pause: None,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, percent: u64) -> Self {
        self.jitter_percent = percent.min(100);
        self
    }

    pub fn with_rate_limit_pause(mut self, pause: Duration) -> Self {
        self.rate_limit_pause = Some(pause);
        self
    }

    /// Backoff after the `retry`-th failure (0-based), without jitter
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter_percent == 0 {
            return delay;
        }
        let millis = delay.as_millis() as i64;
        let range = millis * self.jitter_percent as i64 / 100;
        if range == 0 {
            return delay;
        }
        let jitter = rand::thread_rng().gen_range(-range..=range);
        Duration::from_millis((millis + jitter).max(0) as u64)
    }

    /// Wait before the next attempt, given the backoffs taken so far.
    /// Returns the wait and the updated backoff count; a fixed rate-limit
    /// pause leaves the count untouched.
    fn next_wait(&self, error: &AppError, backoffs: u32) -> (Duration, u32) {
        match (error.code, self.rate_limit_pause) {
            (ErrorCode::RateLimited, Some(pause)) => (pause, backoffs),
            _ => (self.jittered(self.backoff_delay(backoffs)), backoffs + 1),
        }
    }
}

/// States of one retried call
#[derive(Debug)]
enum RetryState<T> {
    Attempting {
        attempt: u32,
        backoffs: u32,
    },
    Backoff {
        attempt: u32,
        wait: Duration,
        backoffs: u32,
        error: AppError,
    },
    Exhausted {
        attempts: u32,
        error: AppError,
    },
    Succeeded {
        attempts: u32,
        value: T,
    },
}

/// Runs a fallible async operation under a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct BackoffRetrier {
    policy: RetryPolicy,
}

impl BackoffRetrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `operation` until it succeeds, fails structurally, or the
    /// attempt budget runs out. The closure receives the 1-based attempt.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut operation: F) -> AppResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut state = RetryState::Attempting {
            attempt: 1,
            backoffs: 0,
        };

        loop {
            state = match state {
                RetryState::Attempting { attempt, backoffs } => match operation(attempt).await {
                    Ok(value) => RetryState::Succeeded {
                        attempts: attempt,
                        value,
                    },
                    Err(error) if !error.code.is_retryable() => return Err(error),
                    Err(error) if attempt >= max_attempts => RetryState::Exhausted {
                        attempts: attempt,
                        error,
                    },
                    Err(error) => {
                        let (wait, backoffs) = self.policy.next_wait(&error, backoffs);
                        RetryState::Backoff {
                            attempt,
                            wait,
                            backoffs,
                            error,
                        }
                    }
                },
                RetryState::Backoff {
                    attempt,
                    wait,
                    backoffs,
                    error,
                } => {
                    warn!(
                        "⏳ {} attempt {}/{} failed: {} (retrying in {}ms)",
                        label,
                        attempt,
                        max_attempts,
                        error,
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                        backoffs,
                    }
                }
                RetryState::Exhausted { attempts, error } => {
                    return Err(AppError::max_retries_exceeded(label, attempts, error));
                }
                RetryState::Succeeded { attempts, value } => {
                    if attempts > 1 {
                        debug!("✅ {} succeeded on attempt {}", label, attempts);
                    }
                    return Ok(value);
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::ready;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_succeeds_after_connectivity_failures() {
        let calls = AtomicU32::new(0);
        let retrier = BackoffRetrier::new(fast_policy(5));

        let result = retrier
            .execute("flaky", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                ready(if attempt < 3 {
                    Err(AppError::connectivity("connection reset"))
                } else {
                    Ok(attempt)
                })
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_budget() {
        let calls = AtomicU32::new(0);
        let retrier = BackoffRetrier::new(fast_policy(4));

        let err = retrier
            .execute("down", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                ready(Err::<(), _>(AppError::connectivity("refused")))
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::MaxRetriesExceeded);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_bad_response_is_not_retried() {
        let calls = AtomicU32::new(0);
        let retrier = BackoffRetrier::new(fast_policy(5));

        let err = retrier
            .execute("broken", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                ready(Err::<(), _>(AppError::bad_response("not json")))
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::BadResponse);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_field_is_not_retried() {
        let calls = AtomicU32::new(0);
        let retrier = BackoffRetrier::new(fast_policy(5));

        let err = retrier
            .execute("partial", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                ready(Err::<(), _>(AppError::missing_field("result")))
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::MissingField);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_shares_budget() {
        let calls = AtomicU32::new(0);
        let retrier = BackoffRetrier::new(
            fast_policy(3).with_rate_limit_pause(Duration::from_millis(1)),
        );

        let err = retrier
            .execute("throttled", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                ready(Err::<(), _>(if attempt == 2 {
                    AppError::connectivity("reset")
                } else {
                    AppError::rate_limited("4029")
                }))
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::MaxRetriesExceeded);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(8));

        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(8));
        assert_eq!(policy.backoff_delay(9), Duration::from_secs(8));
        assert_eq!(policy.backoff_delay(40), Duration::from_secs(8));
    }

    #[test]
    fn test_next_wait_schedule() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1))
            .with_rate_limit_pause(Duration::from_millis(500));

        let (wait, next) = policy.next_wait(&AppError::connectivity("x"), 0);
        assert_eq!(wait, Duration::from_secs(1));
        assert_eq!(next, 1);

        let (wait, next) = policy.next_wait(&AppError::connectivity("x"), 1);
        assert_eq!(wait, Duration::from_secs(2));
        assert_eq!(next, 2);

        // Fixed pause; the backoff progression is left alone
        let (wait, next) = policy.next_wait(&AppError::rate_limited("x"), 2);
        assert_eq!(wait, Duration::from_millis(500));
        assert_eq!(next, 2);

        let (wait, _) = policy.next_wait(&AppError::connectivity("x"), next);
        assert_eq!(wait, Duration::from_secs(4));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1)).with_jitter(20);
        for _ in 0..100 {
            let delay = policy.jittered(Duration::from_millis(1000));
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(1200));
        }
    }
}
