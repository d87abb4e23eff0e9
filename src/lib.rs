//! Gold News Crawler: listing + detail crawler for gold-market news
//!
//! This crate fetches a financial news listing page, optionally enriches the
//! first few articles with their full-text detail pages, and persists the
//! merged records as JSON and CSV for sentiment analysis and dashboards.

pub mod config;
pub mod crawler;
pub mod links;
pub mod models;
pub mod output;
pub mod state;

use std::fmt;
use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawl aborted: {0}")]
    Crawl(#[from] CrawlError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector in config: {0}")]
    InvalidSelector(String),
}

/// The underlying reason a single GET attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The server answered with a non-success status code
    Status(u16),

    /// The request (or reading its body) exceeded the configured timeout
    Timeout,

    /// The connection could not be established
    Connect(String),

    /// The response body could not be read
    Body(String),

    /// Any other request failure (redirect policy, invalid request, ...)
    Request(String),
}

impl FetchFailure {
    /// Returns true if the failure is transient and worth another attempt
    ///
    /// Timeouts, connection errors, body read errors and 5xx responses are
    /// transient. Client errors (4xx) and other request failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status(code) => (500..600).contains(code),
            Self::Timeout | Self::Connect(_) | Self::Body(_) => true,
            Self::Request(_) => false,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Timeout => write!(f, "request timed out"),
            Self::Connect(msg) => write!(f, "connection failed: {}", msg),
            Self::Body(msg) => write!(f, "failed to read body: {}", msg),
            Self::Request(msg) => write!(f, "request failed: {}", msg),
        }
    }
}

/// A GET request that failed after the retry policy was applied
#[derive(Debug, Clone, Error)]
#[error("GET {url} failed after {attempts} attempt(s): {cause}")]
pub struct TransportError {
    /// The requested URL
    pub url: String,

    /// Number of attempts actually made
    pub attempts: u32,

    /// The cause of the last attempt's failure
    pub cause: FetchFailure,
}

/// Errors that abort a whole crawl run
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Failed to fetch listing page: {0}")]
    ListingFetch(#[from] TransportError),
}

/// Link resolution and normalization errors
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for link operations
pub type LinkResult<T> = std::result::Result<T, LinkError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, RunOptions};
pub use models::{ArticleDetail, ArticleRecord, ArticleStub, CrawlResult, CrawlSummary};
pub use output::SaveFormat;
pub use state::FetchState;
