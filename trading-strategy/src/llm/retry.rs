//! Retry policy and combinator for model calls.
//!
//! The delay schedule is a pure function of the attempt number so it can be
//! tested without sleeping; jitter is drawn separately at sleep time.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Short label for an error, used in retry log lines
pub trait ErrorCategory {
    fn category(&self) -> &'static str;
}

/// Exponential backoff with jitter: `unit * min(2^attempt, cap) + U(0, jitter)`
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Ceiling on the exponential factor, in units
    pub backoff_cap: u32,
    pub unit: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_cap: 30,
            unit: Duration::from_secs(1),
            max_jitter: Duration::from_millis(700),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay before the next attempt after `attempt` (0-based) failed, without jitter
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let factor = 2u32
            .checked_pow(attempt)
            .unwrap_or(u32::MAX)
            .min(self.backoff_cap);
        self.unit.saturating_mul(factor)
    }

    /// Random extra delay in `[0, max_jitter)`
    pub fn jitter(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        let fraction: f64 = rand::thread_rng().gen_range(0.0..1.0);
        self.max_jitter.mul_f64(fraction)
    }

    /// Upper bound on any single sleep under this policy
    pub fn max_delay(&self) -> Duration {
        self.unit.saturating_mul(self.backoff_cap) + self.max_jitter
    }
}

/// Every attempt failed; carries the last observed error
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// A successful value plus the number of attempts it took
#[derive(Debug)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// Run `op` until it succeeds or the policy's attempt budget is spent.
///
/// `op` receives the 0-based attempt number. Failures are logged with the
/// attempt number and error category; sleeps happen only between attempts.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<Retried<T>, RetryExhausted<E>>
where
    E: ErrorCategory + Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op(attempt).await {
            Ok(value) => {
                return Ok(Retried {
                    value,
                    attempts: attempt + 1,
                })
            }
            Err(e) => {
                tracing::warn!(
                    "{}: attempt {}/{} failed [{}]: {}",
                    label,
                    attempt + 1,
                    max_attempts,
                    e.category(),
                    e
                );

                if attempt + 1 >= max_attempts {
                    return Err(RetryExhausted {
                        attempts: max_attempts,
                        last_error: e,
                    });
                }

                let delay = policy.backoff_duration(attempt) + policy.jitter();
                tracing::debug!("{}: retrying in {}ms", label, delay.as_millis());
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Flaky;

    impl Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("flaky")
        }
    }

    impl ErrorCategory for Flaky {
        fn category(&self) -> &'static str {
            "flaky"
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff_cap, 30);
        assert_eq!(policy.max_delay(), Duration::from_millis(30_700));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_duration(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_duration(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_duration(4), Duration::from_secs(16));
        assert_eq!(policy.backoff_duration(5), Duration::from_secs(30));
        assert_eq!(policy.backoff_duration(40), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_bounded() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            assert!(policy.jitter() < policy.max_jitter);
        }

        let no_jitter = RetryPolicy {
            max_jitter: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(no_jitter.jitter(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result = retry_with_backoff(&policy, "test", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(Flaky)
                } else {
                    Ok(attempt)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result.value, 2);
        assert_eq!(result.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_budget() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default().with_max_attempts(3);

        let err = retry_with_backoff(&policy, "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Flaky) }
        })
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy::default().with_max_attempts(0);
        let result = retry_with_backoff(&policy, "test", |_| async { Ok::<_, Flaky>(7) })
            .await
            .unwrap();
        assert_eq!(result.value, 7);
    }
}
