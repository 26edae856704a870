//! Circuit breaker guarding calls to a single provider.
//!
//! CLOSED counts consecutive failures and trips to OPEN at the threshold.
//! OPEN rejects every call until `reset_timeout` has elapsed, then lets calls
//! through in HALF_OPEN. Enough consecutive successes close the breaker, a
//! single failure reopens it.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures in CLOSED that trip the breaker
    pub failure_threshold: u32,
    /// How long OPEN rejects calls before probing
    pub reset_timeout: Duration,
    /// Consecutive HALF_OPEN successes needed to close
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
            half_open_success_threshold: 2,
        }
    }
}

/// Error returned by [`CircuitBreaker::execute`]
#[derive(Debug, thiserror::Error)]
pub enum CircuitError<E> {
    #[error("Circuit open for {name}")]
    Open { name: String },

    #[error("{0}")]
    Inner(E),
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
    /// A HALF_OPEN trial call is running; others fail fast until it ends
    probe_in_flight: bool,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    /// Current state, moving OPEN to HALF_OPEN if the reset timeout elapsed.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        inner.state
    }

    /// Run `op` through the breaker; every error counts as a failure.
    pub async fn execute<F, Fut, T, E>(&self, op: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with(op, |_| true).await
    }

    /// Run `op` through the breaker; only errors matching `is_failure` count.
    ///
    /// Errors that are not failures (e.g. "no match") still reach the caller
    /// but reset the consecutive-failure count like a success.
    pub async fn execute_with<F, Fut, T, E, P>(
        &self,
        op: F,
        is_failure: P,
    ) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnOnce(&E) -> bool,
    {
        let Some(probe) = self.allow_request() else {
            debug!("{}: circuit open, rejecting call", self.name);
            return Err(CircuitError::Open {
                name: self.name.clone(),
            });
        };
        let _slot = probe.then(|| ProbeSlot(self));

        match op().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(e) => {
                if is_failure(&e) {
                    self.on_failure();
                } else {
                    self.on_success();
                }
                Err(CircuitError::Inner(e))
            }
        }
    }

    /// `None` rejects the call; `Some(true)` admits it as the HALF_OPEN probe.
    fn allow_request(&self) -> Option<bool> {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        match inner.state {
            CircuitState::Closed => Some(false),
            CircuitState::Open => None,
            CircuitState::HalfOpen if inner.probe_in_flight => None,
            CircuitState::HalfOpen => {
                inner.probe_in_flight = true;
                Some(true)
            }
        }
    }

    fn refresh(&self, inner: &mut BreakerState) {
        if inner.state == CircuitState::Open
            && inner
                .opened_at
                .is_some_and(|at| at.elapsed() >= self.config.reset_timeout)
        {
            debug!("{}: reset timeout elapsed, probing (HALF_OPEN)", self.name);
            inner.state = CircuitState::HalfOpen;
            inner.half_open_successes = 0;
        }
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => inner.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.half_open_success_threshold {
                    debug!("{}: circuit closed", self.name);
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.half_open_successes = 0;
                    inner.opened_at = None;
                }
            }
            // A call admitted before the breaker tripped finished late
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        "{}: {} consecutive failures, circuit opened",
                        self.name, inner.consecutive_failures
                    );
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                warn!("{}: probe failed, circuit reopened", self.name);
                inner.state = CircuitState::Open;
                inner.half_open_successes = 0;
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::Open => {}
        }
    }
}

/// Frees the HALF_OPEN probe slot when the probing call ends or is dropped.
struct ProbeSlot<'a>(&'a CircuitBreaker);

impl Drop for ProbeSlot<'_> {
    fn drop(&mut self) {
        self.0.inner.lock().probe_in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig {
                failure_threshold: 3,
                reset_timeout: Duration::from_secs(30),
                half_open_success_threshold: 2,
            },
        )
    }

    async fn fail(cb: &CircuitBreaker) -> Result<(), CircuitError<&'static str>> {
        cb.execute(|| async { Err::<(), _>("boom") }).await
    }

    async fn succeed(cb: &CircuitBreaker) -> Result<(), CircuitError<&'static str>> {
        cb.execute(|| async { Ok::<(), &'static str>(()) }).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_trips_after_threshold() {
        let cb = breaker();
        for _ in 0..2 {
            assert!(matches!(fail(&cb).await, Err(CircuitError::Inner("boom"))));
        }
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(fail(&cb).await.is_err());
        assert_eq!(cb.state(), CircuitState::Open);

        // Rejected without running the operation
        let mut ran = false;
        let result = cb
            .execute(|| {
                ran = true;
                async { Ok::<(), &'static str>(()) }
            })
            .await;
        assert!(matches!(result, Err(CircuitError::Open { .. })));
        assert!(!ran);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failure_count() {
        let cb = breaker();
        let _ = fail(&cb).await;
        let _ = fail(&cb).await;
        succeed(&cb).await.unwrap();
        let _ = fail(&cb).await;
        let _ = fail(&cb).await;
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_closes_after_successes() {
        let cb = breaker();
        for _ in 0..3 {
            let _ = fail(&cb).await;
        }
        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cb.state(), CircuitState::Open);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        succeed(&cb).await.unwrap();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        succeed(&cb).await.unwrap();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens() {
        let cb = breaker();
        for _ in 0..3 {
            let _ = fail(&cb).await;
        }
        tokio::time::advance(Duration::from_secs(30)).await;
        succeed(&cb).await.unwrap();
        assert!(fail(&cb).await.is_err());
        assert_eq!(cb.state(), CircuitState::Open);

        // A fresh timeout applies from the reopen
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(matches!(succeed(&cb).await, Err(CircuitError::Open { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_admits_one_probe_at_a_time() {
        let cb = breaker();
        for _ in 0..3 {
            let _ = fail(&cb).await;
        }
        tokio::time::advance(Duration::from_secs(30)).await;

        let probe = cb.execute(|| async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<(), &'static str>(())
        });
        let concurrent = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            succeed(&cb).await
        };
        let (probe, concurrent) = tokio::join!(probe, concurrent);
        assert!(probe.is_ok());
        assert!(matches!(concurrent, Err(CircuitError::Open { .. })));

        // Slot is free again once the probe finished
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        succeed(&cb).await.unwrap();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_probe_frees_slot() {
        let cb = breaker();
        for _ in 0..3 {
            let _ = fail(&cb).await;
        }
        tokio::time::advance(Duration::from_secs(30)).await;

        let hung = cb.execute(|| std::future::pending::<Result<(), &'static str>>());
        let timed_out = tokio::time::timeout(Duration::from_secs(1), hung).await;
        assert!(timed_out.is_err());

        succeed(&cb).await.unwrap();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_failures_do_not_trip() {
        let cb = breaker();
        for _ in 0..5 {
            let result = cb
                .execute_with(|| async { Err::<(), _>("not found") }, |_| false)
                .await;
            assert!(matches!(result, Err(CircuitError::Inner("not found"))));
        }
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
