//! HTTP client with bounded retry and exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tokio::time::sleep;
use tracing::warn;

/// How a single logical GET retries on transient failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempt budget; values below 1 are treated as 1
    pub max_retries: u32,
    /// Backoff base; attempt `n` waits `base_delay * factor^n`
    pub base_delay: Duration,
    /// Backoff factor for HTTP 429. Generic errors always back off with factor 2;
    /// rate limits use this factor so they can be more aggressive.
    pub rate_limit_factor: f64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, rate_limit_factor: f64) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_delay,
            rate_limit_factor,
        }
    }

    fn generic_backoff(&self, attempt: u32) -> Duration {
        self.base_delay.mul_f64(2f64.powi(attempt as i32))
    }

    fn rate_limit_backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .mul_f64(self.rate_limit_factor.powi(attempt as i32))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            rate_limit_factor: 2.0,
        }
    }
}

/// Terminal failure of a retried GET.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Non-retryable client error (4xx other than 429)
    #[error("client error: HTTP {0}")]
    Client(u16),

    /// 429 responses persisted through the whole attempt budget
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Connection errors, timeouts, or 5xx persisted through the attempt budget
    #[error("gave up after {attempts} attempts: {reason}")]
    Exhausted { attempts: u32, reason: String },

    /// 2xx response whose body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Shared HTTP client. All pipeline stages issue requests through this wrapper so
/// timeout and User-Agent are configured in one place.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a client with the crate's identifying User-Agent and the given
    /// request timeout.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get the underlying client, for callers with their own retry semantics
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Issue a GET with query parameters under the given retry policy.
    ///
    /// 2xx returns immediately. Connection errors, timeouts, and 5xx back off with
    /// factor 2; 429 backs off with the policy's rate-limit factor, consuming an
    /// attempt. Any other status is returned as [`FetchError::Client`] without
    /// retrying.
    pub async fn get_with_retry(
        &self,
        url: &str,
        params: &[(&str, String)],
        policy: &RetryPolicy,
    ) -> Result<Response, FetchError> {
        let max = policy.max_retries.max(1);
        let mut rate_limited = false;
        let mut last_reason = String::new();

        for attempt in 0..max {
            match self.client.get(url).query(params).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        rate_limited = true;
                        last_reason = "HTTP 429".to_string();
                        if attempt + 1 < max {
                            let wait = policy.rate_limit_backoff(attempt);
                            warn!(
                                attempt = attempt + 1,
                                max, ?wait, url, "rate limited, backing off"
                            );
                            sleep(wait).await;
                        }
                        continue;
                    }
                    if status.is_server_error() {
                        rate_limited = false;
                        last_reason = format!("HTTP {}", status.as_u16());
                        if attempt + 1 < max {
                            let wait = policy.generic_backoff(attempt);
                            warn!(
                                attempt = attempt + 1,
                                max,
                                status = status.as_u16(),
                                ?wait,
                                url,
                                "server error, retrying"
                            );
                            sleep(wait).await;
                        }
                        continue;
                    }
                    // Remaining 4xx indicate a malformed request, not a transient
                    // condition; retrying cannot help.
                    warn!(status = status.as_u16(), url, "client error, not retrying");
                    return Err(FetchError::Client(status.as_u16()));
                }
                Err(err) => {
                    rate_limited = false;
                    last_reason = if err.is_timeout() {
                        "request timed out".to_string()
                    } else {
                        format!("connection error: {}", err)
                    };
                    if attempt + 1 < max {
                        let wait = policy.generic_backoff(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max,
                            ?wait,
                            url,
                            reason = %last_reason,
                            "request failed, retrying"
                        );
                        sleep(wait).await;
                    }
                }
            }
        }

        if rate_limited {
            Err(FetchError::RateLimited { attempts: max })
        } else {
            Err(FetchError::Exhausted {
                attempts: max,
                reason: last_reason,
            })
        }
    }
}
