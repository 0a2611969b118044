//! Async exponential backoff with jitter, wrapping a single fallible
//! operation. Used exclusively by `PageFetcher` — the worker's outer loop
//! does not retry the pipeline itself; the scheduler does that implicitly by
//! re-upserting `pending` jobs every cycle.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: f64,
    pub jitter: f64,
    pub ceiling: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: 2.0,
            jitter: 0.3,
            ceiling: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Runs `op` up to `max_attempts` times. Attempts are numbered starting
    /// at 1. On failure, sleeps `base^attempt * uniform(1-jitter, 1+jitter)`
    /// seconds, capped at `ceiling`, then tries again. The error from the
    /// final attempt is returned unmodified.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }

                    let raw = self.base.powi(attempt as i32);
                    let jittered =
                        raw * rand::rng().random_range(1.0 - self.jitter..=1.0 + self.jitter);
                    let sleep_for = Duration::from_secs_f64(jittered.max(0.0)).min(self.ceiling);

                    warn!(attempt, sleep_secs = sleep_for.as_secs_f64(), "retrying");
                    tokio::time::sleep(sleep_for).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn single_attempt_runs_exactly_once_and_propagates_error() {
        let policy = RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        };
        let calls = AtomicU32::new(0);

        let result: Result<(), &str> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("boom") }
            })
            .await;

        assert_eq!(result, Err("boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base: 1.0,
            jitter: 0.0,
            ceiling: Duration::from_millis(10),
        };
        let calls = AtomicU32::new(0);

        let result: Result<&str, &str> = policy
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("not yet")
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_all_attempts_then_returns_last_error() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base: 1.0,
            jitter: 0.0,
            ceiling: Duration::from_millis(5),
        };
        let calls = AtomicU32::new(0);

        let result: Result<(), u32> = policy
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(n) }
            })
            .await;

        assert_eq!(result, Err(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
