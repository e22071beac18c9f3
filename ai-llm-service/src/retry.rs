//! Retry with backoff around a single fallible async operation.
//!
//! The policy is parameterized once and reused by every call site:
//! how many attempts, how long to wait after each failed attempt, and which
//! errors are worth another try.

use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::warn;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failed attempt.
    Fixed(Duration),
    /// `step * n` after the n-th failed attempt (10s, 20s, ... for a 10s step).
    Linear { step: Duration },
}

impl Backoff {
    /// Delay to wait after the `attempt`-th failure (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Linear { step } => step.saturating_mul(attempt.max(1)),
        }
    }
}

/// Attempt budget plus backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Three attempts with 10s then 20s pauses between them.
    pub fn rate_limit_default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Linear {
                step: Duration::from_secs(10),
            },
        }
    }

    /// Runs `op` under this policy.
    pub async fn run<T, E, F, Fut, R>(&self, op: F, is_retryable: R) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let backoff = self.backoff;
        with_retry(op, self.max_attempts, |n| backoff.delay(n), is_retryable).await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::rate_limit_default()
    }
}

/// Final result of a retried operation together with the number of attempts made.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Executes `op` up to `max_attempts` times.
///
/// After the n-th failed attempt whose error satisfies `is_retryable`, waits
/// `backoff(n)` and tries again. A non-retryable error, or a retryable one on
/// the last attempt, is returned as-is. `max_attempts == 0` is treated as 1.
pub async fn with_retry<T, E, F, Fut, B, R>(
    mut op: F,
    max_attempts: u32,
    backoff: B,
    is_retryable: R,
) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Fn(u32) -> Duration,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt,
                };
            }
            Err(err) if attempt < max_attempts && is_retryable(&err) => {
                let delay = backoff(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs_f64(),
                    error = %err,
                    "retryable failure, backing off"
                );
                sleep(delay).await;
            }
            Err(err) => {
                return RetryOutcome {
                    result: Err(err),
                    attempts: attempt,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    enum TestErr {
        Busy,
        Fatal,
    }

    impl std::fmt::Display for TestErr {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    #[test]
    fn linear_backoff_grows_by_step() {
        let b = Backoff::Linear {
            step: Duration::from_secs(10),
        };
        assert_eq!(b.delay(1), Duration::from_secs(10));
        assert_eq!(b.delay(2), Duration::from_secs(20));
        assert_eq!(Backoff::Fixed(Duration::from_secs(3)).delay(7), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success_with_linear_delays() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let out = RetryPolicy::rate_limit_default()
            .run(
                || async {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 { Err(TestErr::Busy) } else { Ok("done") }
                },
                |e| *e == TestErr::Busy,
            )
            .await;

        assert_eq!(out.result.unwrap(), "done");
        assert_eq!(out.attempts, 3);
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let out: RetryOutcome<(), TestErr> = RetryPolicy::rate_limit_default()
            .run(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestErr::Busy)
                },
                |e| *e == TestErr::Busy,
            )
            .await;

        assert_eq!(out.result.unwrap_err(), TestErr::Busy);
        assert_eq!(out.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // No sleep after the final attempt.
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let out: RetryOutcome<(), TestErr> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestErr::Fatal)
            },
            3,
            |_| Duration::from_secs(10),
            |e| *e == TestErr::Busy,
        )
        .await;

        assert_eq!(out.result.unwrap_err(), TestErr::Fatal);
        assert_eq!(out.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_runs_once() {
        let out: RetryOutcome<u8, TestErr> =
            with_retry(|| async { Ok(7) }, 0, |_| Duration::ZERO, |_| true).await;
        assert_eq!(out.result.unwrap(), 7);
        assert_eq!(out.attempts, 1);
    }
}
