//! Bounded retry with exponential backoff
//!
//! Attempt `n` failing with a transient error sleeps `base * 2^(n-1)`
//! before attempt `n + 1`. There is no sleep after the final attempt and
//! no jitter. Permanent errors return immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, ScoutError};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; zero is treated as one.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A policy that never retries
    pub fn single_attempt() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exp)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. Exhaustion wraps the last
    /// error in [`ScoutError::RetriesExhausted`].
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if attempt >= self.max_attempts {
                tracing::warn!(target_name = label, attempts = attempt, error = %err, "giving up");
                return Err(ScoutError::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            let delay = self.delay_after(attempt);
            tracing::warn!(
                target_name = label,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn http(status: u16) -> ScoutError {
        ScoutError::HttpStatus {
            url: "https://example.com".to_string(),
            status,
        }
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_503_uses_all_attempts_with_backoff() {
        let policy = RetryPolicy::default();
        let starts = Arc::new(Mutex::new(Vec::new()));
        let origin = Instant::now();

        let result: Result<()> = policy
            .run("test", |_| {
                let starts = starts.clone();
                async move {
                    starts.lock().unwrap().push(origin.elapsed());
                    Err(http(503))
                }
            })
            .await;

        match result {
            Err(ScoutError::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, ScoutError::HttpStatus { status: 503, .. }));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }

        let starts = starts.lock().unwrap().clone();
        assert_eq!(starts.len(), 3);
        assert_eq!(starts[1] - starts[0], Duration::from_secs(1));
        assert_eq!(starts[2] - starts[1], Duration::from_secs(2));
        // No sleep after the last attempt.
        assert_eq!(origin.elapsed(), starts[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_404_fails_after_one_attempt() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let origin = Instant::now();

        let result: Result<()> = policy
            .run("test", |_| {
                calls += 1;
                async { Err(http(404)) }
            })
            .await;

        assert_eq!(calls, 1);
        assert!(matches!(
            result,
            Err(ScoutError::HttpStatus { status: 404, .. })
        ));
        assert_eq!(origin.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let policy = RetryPolicy::default();

        let result = policy
            .run("test", |attempt| async move {
                if attempt < 2 {
                    Err(http(429))
                } else {
                    Ok(attempt)
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 2);
    }

    #[tokio::test]
    async fn test_single_attempt_policy_wraps_transient_error() {
        let policy = RetryPolicy::single_attempt();
        let result: Result<()> = policy.run("test", |_| async { Err(http(500)) }).await;
        assert!(matches!(
            result,
            Err(ScoutError::RetriesExhausted { attempts: 1, .. })
        ));
    }
}
