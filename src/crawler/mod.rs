//! Crawler module for listing and article page processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded retry and backoff
//! - Listing page parsing into article stubs
//! - Detail page parsing into article enrichment
//! - Overall crawl coordination

mod coordinator;
mod detail;
mod listing;
mod transport;

pub use coordinator::{Coordinator, CrawlReport, RunOptions};
pub use detail::{is_meaningful_title, DetailParser};
pub use listing::{ListingPage, ListingParser};
pub use transport::{build_http_client, HttpTransport, RetryPolicy};

use crate::config::Config;
use crate::CrawlerError;

/// Runs a complete crawl operation with the configured options
///
/// This is the simplest entry point: build a [`Coordinator`] from `config`
/// and run it once with [`RunOptions::from_config`].
///
/// # Example
///
/// ```no_run
/// use gold_news_crawler::config::load_config;
/// use gold_news_crawler::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawler.toml"))?;
/// let report = crawl(config).await?;
/// println!("{} records", report.result.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> Result<CrawlReport, CrawlerError> {
    let options = RunOptions::from_config(&config);
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.run(&options).await?)
}
