//! HTTP transport for listing and detail pages
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building one HTTP client per run with browser-like headers and a cookie store
//! - GET requests with a per-request timeout
//! - Retry with exponential backoff and jitter for transient failures
//! - Error classification

use crate::config::TransportConfig;
use crate::state::FetchState;
use crate::{FetchFailure, TransportError};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS};
use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client shared by every request of one run
///
/// The client carries the configured browser identity as default headers,
/// keeps server-issued cookies for the lifetime of the run, and reuses
/// connections. `Accept-Encoding` is advertised by the gzip/brotli decoders.
///
/// # Example
///
/// ```no_run
/// use gold_news_crawler::config::TransportConfig;
/// use gold_news_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&TransportConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &TransportConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&config.accept) {
        headers.insert(ACCEPT, value);
    }
    if let Ok(value) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retry timing derived from [`TransportConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per URL, including the first
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub base_delay: Duration,

    /// Cap for the exponential part of the delay
    pub max_delay: Duration,

    /// Upper bound of the random jitter added to every delay
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
            max_jitter: Duration::from_millis(config.jitter_ms),
        }
    }

    /// Exponential delay after the given failed attempt, without jitter
    ///
    /// `min(base * 2^(attempt-1), max)`: with a 1s base, 1s after the first
    /// attempt, 2s after the second, 4s after the third.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Backoff plus a random jitter in `0..=max_jitter`
    fn delay_with_jitter(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
        };
        self.backoff(attempt) + jitter
    }
}

/// HTTP transport with one session per crawl run
pub struct HttpTransport {
    client: Client,
    policy: RetryPolicy,
}

impl HttpTransport {
    /// Creates a transport from the transport configuration
    pub fn new(config: &TransportConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            policy: RetryPolicy::from_config(config),
        })
    }

    /// Returns the retry policy in effect
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL and returns its body as text
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return body |
    /// | HTTP 4xx | Fail immediately |
    /// | HTTP 5xx | Retry with backoff |
    /// | Timeout | Retry with backoff |
    /// | Connection error | Retry with backoff |
    /// | Body read error | Retry with backoff |
    /// | Other request error | Fail immediately |
    ///
    /// After `max_attempts` attempts the last failure is returned.
    pub async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let mut state = FetchState::Idle;

        loop {
            tracing::trace!("{}: {}", url, state);
            state = match state {
                FetchState::Idle => FetchState::Fetching { attempt: 1 },

                FetchState::Fetching { attempt } => {
                    tracing::debug!("GET {} (attempt {}/{})", url, attempt, self.policy.max_attempts);
                    let outcome = self.attempt(url).await;
                    FetchState::after_attempt(attempt, outcome, self.policy.max_attempts)
                }

                FetchState::Retrying { attempt, cause } => {
                    let delay = self.policy.delay_with_jitter(attempt);
                    tracing::warn!(
                        "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempt,
                        self.policy.max_attempts,
                        url,
                        cause,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    FetchState::Fetching {
                        attempt: attempt + 1,
                    }
                }

                FetchState::Succeeded { attempts, body } => {
                    tracing::debug!("Fetched {} in {} attempt(s), {} bytes", url, attempts, body.len());
                    return Ok(body);
                }

                FetchState::Failed { attempts, cause } => {
                    tracing::warn!("Giving up on {} after {} attempt(s): {}", url, attempts, cause);
                    return Err(TransportError {
                        url: url.to_string(),
                        attempts,
                        cause,
                    });
                }
            };
        }
    }

    /// Issues a single GET request and classifies its outcome
    async fn attempt(&self, url: &str) -> Result<String, FetchFailure> {
        let response = self.client.get(url).send().await.map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        response.text_with_charset("utf-8").await.map_err(|e| {
            if e.is_timeout() {
                FetchFailure::Timeout
            } else {
                FetchFailure::Body(e.to_string())
            }
        })
    }
}

/// Maps a reqwest send error onto a fetch failure
fn classify_error(error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else if error.is_connect() {
        FetchFailure::Connect(error.to_string())
    } else if let Some(status) = error.status() {
        FetchFailure::Status(status.as_u16())
    } else if error.is_body() || error.is_decode() {
        FetchFailure::Body(error.to_string())
    } else {
        FetchFailure::Request(error.to_string())
    }
}
