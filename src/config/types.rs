use crate::output::SaveFormat;
use serde::Deserialize;

/// Main configuration structure for the crawler
///
/// Every section is optional; missing sections and keys fall back to the
/// defaults for the fx678 gold news channel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub transport: TransportConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
}

/// The news source and the structural pattern of its listing page
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Site base used to resolve relative article links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Listing page URL template; `{page}` is replaced by the page number
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Selector matching one article link per listing item
    #[serde(rename = "link-selector")]
    pub link_selector: String,

    /// Selector for timestamp elements inside a listing item
    #[serde(rename = "time-selector")]
    pub time_selector: String,

    /// Selector for summary text inside a listing item
    #[serde(rename = "summary-selector")]
    pub summary_selector: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gold.fx678.com".to_string(),
            listing_url: "https://gold.fx678.com/goldNews/hj?p={page}".to_string(),
            link_selector: r#"a[href*="/content/"]"#.to_string(),
            time_selector: "span[class*=time], div[class*=time], time, span[class*=date], div[class*=date]"
                .to_string(),
            summary_selector: "p, [class*=summary], [class*=desc]".to_string(),
        }
    }
}

impl SourceConfig {
    /// Returns the listing URL for the given 1-based page number
    pub fn listing_page_url(&self, page: u32) -> String {
        self.listing_url.replace("{page}", &page.to_string())
    }
}

/// HTTP identity, timeout and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Browser-like User-Agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Accept header value
    pub accept: String,

    /// Accept-Language header value
    #[serde(rename = "accept-language")]
    pub accept_language: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Maximum number of attempts per URL, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt (milliseconds); doubles per attempt
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for the exponential part of the delay (milliseconds)
    #[serde(rename = "backoff-max-ms")]
    pub backoff_max_ms: u64,

    /// Maximum random jitter added to each delay (milliseconds)
    #[serde(rename = "jitter-ms")]
    pub jitter_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8".to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
            max_attempts: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 30_000,
            jitter_ms: 250,
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Whether to fetch detail pages
    #[serde(rename = "get-details")]
    pub get_details: bool,

    /// Maximum number of detail pages to fetch, in listing order
    #[serde(rename = "max-details")]
    pub max_details: usize,

    /// Fixed delay before each detail fetch (milliseconds)
    #[serde(rename = "detail-delay-ms")]
    pub detail_delay_ms: u64,

    /// Number of listing pages to walk
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Delay between listing page fetches (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Stop paginating once this many unique stubs are collected
    #[serde(rename = "target-count")]
    pub target_count: Option<usize>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            get_details: false,
            max_details: 5,
            detail_delay_ms: 1000,
            max_pages: 1,
            page_delay_ms: 2000,
            target_count: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the timestamped JSON/CSV files
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// Which formats to write
    #[serde(rename = "save-format")]
    pub save_format: SaveFormat,

    /// Optional file that receives a copy of the log stream
    #[serde(rename = "log-file")]
    pub log_file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: "gold_news_data".to_string(),
            save_format: SaveFormat::Both,
            log_file: None,
        }
    }
}
