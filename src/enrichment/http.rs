//! HTTP plumbing shared by every provider client.
//!
//! Each client owns one [`ProviderGuard`]: a token bucket spacing out its
//! requests, a circuit breaker, and a retry policy for transient failures.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::domain::EnrichmentError;
use super::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitError, RetryPolicy, TokenBucket,
    retry_with_backoff,
};

/// User agent string - MusicBrainz requires a descriptive one
pub const USER_AGENT: &str = concat!(
    "ListenTracker/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/listen-tracker/listen-tracker)"
);

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Error bodies are truncated to this many characters in messages
const MAX_ERROR_BODY: usize = 200;

/// Build a reqwest client with our user agent and timeout.
pub fn build_client(
    user_agent: &str,
    timeout: Duration,
) -> Result<reqwest::Client, EnrichmentError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| EnrichmentError::Network(format!("Failed to build HTTP client: {}", e)))
}

pub fn network_error(e: reqwest::Error) -> EnrichmentError {
    if e.is_timeout() {
        EnrichmentError::Network(format!("timeout: {}", e))
    } else {
        EnrichmentError::Network(e.to_string())
    }
}

/// Map a non-success status to our error taxonomy.
pub fn status_error(status: u16, body: &str) -> EnrichmentError {
    match status {
        404 => EnrichmentError::NoMatches,
        429 => EnrichmentError::RateLimited,
        _ => {
            let message: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
            let message = if message.is_empty() {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown")
                    .to_string()
            } else {
                message
            };
            EnrichmentError::Http { status, message }
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, EnrichmentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &body))
}

/// Send the request and parse a JSON body.
pub async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, EnrichmentError> {
    let response = request.send().await.map_err(network_error)?;
    check_status(response)
        .await?
        .json::<T>()
        .await
        .map_err(|e| EnrichmentError::Parse(e.to_string()))
}

/// Send the request and return the body as text.
pub async fn send_text(request: reqwest::RequestBuilder) -> Result<String, EnrichmentError> {
    let response = request.send().await.map_err(network_error)?;
    check_status(response)
        .await?
        .text()
        .await
        .map_err(network_error)
}

/// Send the request and return the raw body.
pub async fn send_bytes(request: reqwest::RequestBuilder) -> Result<Vec<u8>, EnrichmentError> {
    let response = request.send().await.map_err(network_error)?;
    let bytes = check_status(response)
        .await?
        .bytes()
        .await
        .map_err(network_error)?;
    Ok(bytes.to_vec())
}

/// Resilience settings for one provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub name: &'static str,
    /// Courtesy delay between distinct requests
    pub min_interval: Duration,
    pub retry: RetryPolicy,
    pub breaker: CircuitBreakerConfig,
}

impl ProviderSettings {
    pub fn new(name: &'static str, min_interval: Duration) -> Self {
        Self {
            name,
            min_interval,
            retry: RetryPolicy::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Rate limiting, circuit breaking and retries for one provider.
#[derive(Debug)]
pub struct ProviderGuard {
    name: &'static str,
    limiter: TokenBucket,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
}

impl ProviderGuard {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            name: settings.name,
            limiter: TokenBucket::per_interval(settings.min_interval),
            breaker: CircuitBreaker::new(settings.name, settings.breaker),
            retry: settings.retry,
        }
    }

    /// Run one logical request: wait for a token, go through the breaker,
    /// and retry transient failures.
    pub async fn call<T, F, Fut>(&self, label: &str, op: F) -> Result<T, EnrichmentError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, EnrichmentError>>,
    {
        let op = &op;
        let label = format!("{} {}", self.name, label);
        retry_with_backoff(
            &self.retry,
            &label,
            EnrichmentError::is_retryable,
            |attempt, e, delay| {
                debug!(provider = self.name, attempt, ?delay, "retrying after: {}", e)
            },
            move || self.guarded(op),
        )
        .await
    }

    async fn guarded<T, F, Fut>(&self, op: &F) -> Result<T, EnrichmentError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, EnrichmentError>>,
    {
        self.limiter.acquire().await;
        self.breaker
            .execute_with(op, EnrichmentError::is_retryable)
            .await
            .map_err(|e| match e {
                CircuitError::Open { name } => EnrichmentError::CircuitOpen(name),
                CircuitError::Inner(e) => e,
            })
    }
}
