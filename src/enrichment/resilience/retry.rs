//! Retry with exponential backoff and jitter.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Backoff parameters for [`retry_with_backoff`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Cap for exponential growth.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub factor: f64,
    /// Fraction of the delay randomized in both directions (0.0 disables).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            factor: 2.0,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (0-based), without jitter.
    ///
    /// `initial_delay * factor^retry`, capped at `max_delay`.
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let millis = self.initial_delay.as_millis() as f64 * self.factor.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Delay before retry number `retry` with jitter applied.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        if self.jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let spread = self.jitter.min(1.0);
        let scale = rand::rng().random_range(1.0 - spread..=1.0 + spread);
        base.mul_f64(scale).min(self.max_delay)
    }
}

/// Retry an async operation with exponential backoff.
///
/// Calls `op` up to `policy.max_attempts` times. Errors rejected by
/// `is_retryable` are returned immediately. `on_retry` observes each retry
/// with the 1-based attempt that failed, the error and the upcoming delay.
pub async fn retry_with_backoff<F, Fut, T, E, R, O>(
    policy: &RetryPolicy,
    label: &str,
    is_retryable: R,
    mut on_retry: O,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    R: Fn(&E) -> bool,
    O: FnMut(u32, &E, Duration),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                let delay = policy.delay_for(attempt - 1);
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    label, attempt, max_attempts, delay, e
                );
                on_retry(attempt, &e, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if attempt > 1 {
                    warn!("{} failed after {} attempts: {}", label, attempt, e);
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            factor: 2.0,
            jitter: 0.0,
        }
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy {
            max_attempts: 6,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            factor: 2.0,
            jitter: 0.0,
        };
        assert_eq!(policy.base_delay(0), Duration::from_millis(100));
        assert_eq!(policy.base_delay(1), Duration::from_millis(200));
        assert_eq!(policy.base_delay(3), Duration::from_millis(800));
        // Capped
        assert_eq!(policy.base_delay(4), Duration::from_millis(1000));
        assert_eq!(policy.base_delay(40), Duration::from_millis(1000));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let policy = RetryPolicy {
            jitter: 0.5,
            ..fast_policy(3)
        };
        for _ in 0..100 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_micros(9_999));
            assert!(delay <= Duration::from_micros(30_001));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let mut retries = Vec::new();
        let result: Result<u32, String> = retry_with_backoff(
            &fast_policy(5),
            "flaky",
            |_| true,
            |attempt, _, _| retries.push(attempt),
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("fail {n}")) } else { Ok(n) }
            },
        )
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(retries, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            &fast_policy(3),
            "down",
            |_| true,
            |_, _, _| {},
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom".to_string())
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_returns_immediately() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            &fast_policy(5),
            "not-found",
            |e: &String| e != "404",
            |_, _, _| {},
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("404".to_string())
            },
        )
        .await;
        assert_eq!(result, Err("404".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
