/*!
 * Shared HTTP transport for provider clients.
 *
 * Sends JSON requests with retry, exponential backoff with jitter, and an
 * optional client-side rate limit expressed in requests per minute.
 */

use std::time::Duration;

use log::{debug, warn};
use rand::Rng;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::errors::ProviderError;

/// Retry settings for a provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first request
    pub max_retries: u32,
    /// Base backoff time in milliseconds, doubled on each retry
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let base = self.backoff_base_ms.saturating_mul(1u64 << exponent);
        let jitter = if self.backoff_base_ms > 0 {
            rand::rng().random_range(0..=self.backoff_base_ms / 4)
        } else {
            0
        };
        Duration::from_millis(base + jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

/// Client-side rate limiter spacing requests evenly
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    /// Limiter allowing `requests_per_minute`; `None` or zero disables limiting
    pub fn per_minute(requests_per_minute: Option<u32>) -> Option<Self> {
        let rpm = requests_per_minute.filter(|rpm| *rpm > 0)?;
        Some(Self {
            min_interval: Duration::from_millis(60_000 / rpm as u64),
            next_slot: Mutex::new(Instant::now()),
        })
    }

    /// Wait for the next free slot
    pub async fn acquire(&self) {
        let wait_until = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = (*next).max(now);
            *next = slot + self.min_interval;
            slot
        };
        tokio::time::sleep_until(wait_until).await;
    }
}

/// Parse and normalize a provider endpoint
pub fn normalize_endpoint(endpoint: &str) -> Result<String, ProviderError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ProviderError::ConnectionError(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url.as_str().trim_end_matches('/').to_string()),
        other => Err(ProviderError::ConnectionError(format!(
            "Unsupported endpoint scheme '{}' in {}",
            other, endpoint
        ))),
    }
}

/// Map an HTTP error status to a provider error
pub fn status_error(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(body),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(body),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message: body,
        },
    }
}

fn transport_error(error: reqwest::Error, timeout: Duration) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout)
    } else if error.is_connect() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

/// HTTP transport shared by the provider clients
#[derive(Debug)]
pub struct HttpTransport {
    /// Provider name used in logs
    name: &'static str,
    /// HTTP client for making requests
    client: Client,
    /// Per-request timeout
    timeout: Duration,
    /// Retry settings
    retry: RetryPolicy,
    /// Optional request spacing
    rate_limiter: Option<RateLimiter>,
}

impl HttpTransport {
    pub fn new(
        name: &'static str,
        timeout: Duration,
        retry: RetryPolicy,
        rate_limit: Option<u32>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            name,
            client,
            timeout,
            retry,
            rate_limiter: RateLimiter::per_minute(rate_limit),
        })
    }

    /// Send a request built by `build` and decode the JSON body, retrying transient failures
    pub async fn send_json<T, F>(&self, build: F) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0u32;
        loop {
            match self.send_once(&build).await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay(attempt);
                    warn!(
                        "{} request failed ({}), retry {}/{} in {:?}",
                        self.name, error, attempt, self.retry.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn send_once<T, F>(&self, build: &F) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let response = build(&self.client)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !status.is_success() {
            debug!("{} API error ({}): {}", self.name, status, body);
            return Err(status_error(status, body));
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            ProviderError::ParseError(format!("{} response: {} (body: {})", self.name, e, preview))
        })
    }
}
