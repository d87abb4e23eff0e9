//! Crawler coordinator - main crawl orchestration logic
//!
//! This module runs the two-stage pipeline:
//! - Stage 1: fetch and parse listing pages, deduplicating stubs
//! - Stage 2: optionally enrich the first few stubs from their detail pages
//! - Merge stubs and details into records and persist them

use crate::config::Config;
use crate::crawler::detail::{is_meaningful_title, DetailParser};
use crate::crawler::listing::ListingParser;
use crate::crawler::transport::HttpTransport;
use crate::links::dedup_key;
use crate::models::{published_text, ArticleDetail, ArticleRecord, ArticleStub, CrawlResult, CrawlSummary};
use crate::output::{self, SaveFormat, SaveReport};
use crate::{CrawlError, CrawlerError};
use chrono::{Local, NaiveDateTime, Timelike};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Records shown in the end-of-run preview
const PREVIEW_LEN: usize = 3;

/// Per-run knobs, seeded from the configuration and overridable by the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Whether to fetch detail pages
    pub get_details: bool,

    /// Maximum number of detail pages to fetch, in listing order
    pub max_details: usize,

    /// Formats to persist
    pub save_format: SaveFormat,

    /// Number of listing pages to walk
    pub max_pages: u32,

    /// Stop paginating once this many unique stubs are collected
    pub target_count: Option<usize>,

    /// Directory receiving the data files
    pub output_dir: PathBuf,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            get_details: config.crawl.get_details,
            max_details: config.crawl.max_details,
            save_format: config.output.save_format,
            max_pages: config.crawl.max_pages,
            target_count: config.crawl.target_count,
            output_dir: PathBuf::from(&config.output.data_dir),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// The outcome of a full run: the in-memory result plus what was saved
#[derive(Debug)]
pub struct CrawlReport {
    pub result: CrawlResult,
    pub saved: SaveReport,
}

/// Main crawler coordinator structure
///
/// Owns one HTTP session for the lifetime of a run; requests are issued
/// one at a time with fixed delays between them.
pub struct Coordinator {
    config: Config,
    transport: HttpTransport,
    listing: ListingParser,
    detail: DetailParser,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Selectors compiled and HTTP client built
    /// * `Err(CrawlerError)` - Invalid configuration or client build failure
    pub fn new(config: Config) -> Result<Self, CrawlerError> {
        crate::config::validate(&config)?;

        let transport = HttpTransport::new(&config.transport)?;
        let policy = transport.policy();
        tracing::debug!(
            "Retry policy: {} attempt(s), backoff {:?} doubling to {:?}, jitter up to {:?}",
            policy.max_attempts,
            policy.base_delay,
            policy.max_delay,
            policy.max_jitter
        );
        let listing = ListingParser::new(&config.source)?;

        Ok(Self {
            config,
            transport,
            listing,
            detail: DetailParser::new(),
        })
    }

    /// Returns the configuration this coordinator was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the full pipeline and persists the result
    ///
    /// Persistence failures are reported in [`CrawlReport::saved`]; only a
    /// failure to fetch the first listing page aborts the run.
    pub async fn run(&self, options: &RunOptions) -> Result<CrawlReport, CrawlError> {
        let result = self.collect(options).await?;
        log_preview(&result);

        let saved = output::save(&result, options.save_format, &options.output_dir);
        for path in saved.saved_paths() {
            tracing::info!("Saved {} records to {}", result.len(), path.display());
        }
        for (format, err) in saved.errors() {
            tracing::error!("Failed to save {} output: {}", format, err);
        }

        Ok(CrawlReport { result, saved })
    }

    /// Runs the crawl stages without persisting anything
    pub async fn collect(&self, options: &RunOptions) -> Result<CrawlResult, CrawlError> {
        let mut summary = CrawlSummary::default();

        let stubs = self.collect_stubs(options, &mut summary).await?;
        tracing::info!(
            "Listing stage complete: {} unique articles from {} page(s)",
            stubs.len(),
            summary.pages_fetched
        );

        let records = if options.get_details {
            self.enrich(stubs, options.max_details, &mut summary).await
        } else {
            stubs
                .into_iter()
                .map(|stub| ArticleRecord::merge(stub, None, crawl_timestamp()))
                .collect()
        };

        Ok(CrawlResult { records, summary })
    }

    /// Stage 1: walks the listing pages and returns unique stubs in
    /// first-seen order
    async fn collect_stubs(
        &self,
        options: &RunOptions,
        summary: &mut CrawlSummary,
    ) -> Result<Vec<ArticleStub>, CrawlError> {
        let mut seen = HashSet::new();
        let mut stubs = Vec::new();

        for page in 1..=options.max_pages.max(1) {
            if page > 1 {
                pause(self.config.crawl.page_delay_ms).await;
            }

            let url = self.config.source.listing_page_url(page);
            let html = match self.transport.fetch(&url).await {
                Ok(html) => html,
                Err(e) if page == 1 => {
                    tracing::error!("Failed to fetch listing page: {}", e);
                    return Err(CrawlError::ListingFetch(e));
                }
                Err(e) => {
                    tracing::warn!("Stopping pagination at page {}: {}", page, e);
                    break;
                }
            };
            summary.pages_fetched += 1;

            let listing = self.listing.parse_listing(&html);
            summary.items_skipped += listing.skipped;
            if listing.skipped > 0 {
                tracing::warn!(
                    "Skipped {} listing item(s) without title or URL on {}",
                    listing.skipped,
                    url
                );
            }

            if listing.stubs.is_empty() {
                if page == 1 {
                    tracing::warn!("No articles found on {}; the page layout may have changed", url);
                } else {
                    tracing::info!("Listing page {} is empty, stopping pagination", page);
                }
                break;
            }

            tracing::info!("Page {}: {} articles", page, listing.stubs.len());
            for stub in listing.stubs {
                let key = dedup_key(&stub.url).unwrap_or_else(|_| stub.url.clone());
                if seen.insert(key) {
                    stubs.push(stub);
                } else {
                    tracing::debug!("Dropping duplicate article {}", stub.url);
                    summary.duplicates_dropped += 1;
                }
            }

            if let Some(target) = options.target_count {
                if stubs.len() >= target {
                    stubs.truncate(target);
                    tracing::info!("Reached target of {} articles", target);
                    break;
                }
            }
        }

        summary.stubs_found = stubs.len();
        Ok(stubs)
    }

    /// Stage 2: fetches details for the first `max_details` stubs and merges
    /// every stub into a record
    async fn enrich(
        &self,
        stubs: Vec<ArticleStub>,
        max_details: usize,
        summary: &mut CrawlSummary,
    ) -> Vec<ArticleRecord> {
        let wanted = max_details.min(stubs.len());
        tracing::info!("Fetching details for {} of {} articles", wanted, stubs.len());

        let mut records = Vec::with_capacity(stubs.len());
        for (index, stub) in stubs.into_iter().enumerate() {
            let detail = if index < wanted {
                tracing::debug!("Detail {}/{}: {}", index + 1, wanted, stub.url);
                self.fetch_detail(&stub.url, summary).await
            } else {
                None
            };
            records.push(merge_record(stub, detail));
        }

        tracing::info!(
            "Detail stage complete: {} succeeded, {} failed",
            summary.details_succeeded,
            summary.details_failed()
        );
        records
    }

    async fn fetch_detail(&self, url: &str, summary: &mut CrawlSummary) -> Option<ArticleDetail> {
        summary.details_attempted += 1;
        pause(self.config.crawl.detail_delay_ms).await;

        match self.transport.fetch(url).await {
            Ok(html) => {
                summary.details_succeeded += 1;
                let detail = self.detail.parse_detail(&html);
                if detail.body.is_empty() {
                    tracing::warn!("No article body found on {}", url);
                } else {
                    tracing::debug!("Extracted {} chars from {}", detail.body.chars().count(), url);
                }
                Some(detail)
            }
            Err(e) => {
                tracing::warn!(
                    "Detail fetch failed for {} after {} attempt(s): {}",
                    e.url,
                    e.attempts,
                    e.cause
                );
                summary.failed_details.push(url.to_string());
                None
            }
        }
    }
}

/// Merges a stub with its detail, preferring a meaningful detail headline
fn merge_record(mut stub: ArticleStub, detail: Option<ArticleDetail>) -> ArticleRecord {
    if let Some(title) = detail.as_ref().and_then(|d| d.title.as_deref()) {
        if is_meaningful_title(title) {
            stub.title = title.to_string();
        }
    }
    ArticleRecord::merge(stub, detail, crawl_timestamp())
}

/// Local wall-clock time truncated to whole seconds
fn crawl_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

async fn pause(millis: u64) {
    if millis > 0 {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

fn log_preview(result: &CrawlResult) {
    let summary = &result.summary;
    tracing::info!(
        "Crawl finished: {} records ({} pages, {} duplicates dropped, {} items skipped, {}/{} details)",
        result.len(),
        summary.pages_fetched,
        summary.duplicates_dropped,
        summary.items_skipped,
        summary.details_succeeded,
        summary.details_attempted
    );

    for (index, record) in result.records.iter().take(PREVIEW_LEN).enumerate() {
        tracing::info!(
            "  {}. {} [{}] {}",
            index + 1,
            record.title,
            published_text(&record.published_at),
            record.url
        );
    }
}
