//! Resilience helpers wrapped around outbound provider calls.

pub mod circuit_breaker;
pub mod rate_limiter;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitError, CircuitState};
pub use rate_limiter::TokenBucket;
pub use retry::{RetryPolicy, retry_with_backoff};
