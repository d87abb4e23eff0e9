//! Article records produced by the crawl pipeline
//!
//! - [`ArticleStub`]: one item of a listing page
//! - [`ArticleDetail`]: best-effort enrichment from an article page
//! - [`ArticleRecord`]: a stub merged with its optional detail, as persisted
//! - [`CrawlResult`]: the ordered records of one run plus its counts
//!
//! The serialized field names (`time`, `content`, `publish_time`) are the
//! names read by the sentiment analyzer and the dashboard.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Rendering used for parsed timestamps and `crawl_time`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// A publish timestamp as found on a page
///
/// Pages show times in several layouts; values that match a known layout are
/// kept as a timestamp, anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishedAt {
    Parsed(NaiveDateTime),
    Raw(String),
}

impl PublishedAt {
    /// Parses page text into a publish time; blank text yields None
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        for format in DATETIME_FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
                return Some(Self::Parsed(parsed));
            }
        }

        for format in DATE_FORMATS {
            if let Some(parsed) = NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
            {
                return Some(Self::Parsed(parsed));
            }
        }

        Some(Self::Raw(text.to_string()))
    }

    /// Returns the timestamp if the text could be parsed
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Parsed(ts) => Some(*ts),
            Self::Raw(_) => None,
        }
    }
}

impl fmt::Display for PublishedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            Self::Raw(text) => f.write_str(text),
        }
    }
}

impl Serialize for PublishedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublishedAt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text).unwrap_or(Self::Raw(text)))
    }
}

/// Renders an optional publish time, empty when absent
pub fn published_text(value: &Option<PublishedAt>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Serde adapter for `crawl_time` as `%Y-%m-%d %H:%M:%S`
pub mod crawl_time_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT).map_err(de::Error::custom)
    }
}

/// One item of a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleStub {
    /// Headline text, never empty
    pub title: String,

    /// Absolute article URL
    pub url: String,

    /// Listing-page timestamp, if one was found
    pub published_at: Option<PublishedAt>,

    /// Teaser text, possibly empty
    pub summary: String,
}

/// Full-text enrichment scraped from an article page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDetail {
    /// Headline as shown on the article page
    #[serde(rename = "detail_title", default)]
    pub title: Option<String>,

    /// Main article text; empty when no content container was found
    #[serde(rename = "content")]
    pub body: String,

    /// Article-page timestamp
    #[serde(rename = "publish_time", default)]
    pub published_at: Option<PublishedAt>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// A listing stub merged with its optional detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,

    pub url: String,

    #[serde(rename = "time")]
    pub published_at: Option<PublishedAt>,

    #[serde(default)]
    pub summary: String,

    /// Wall-clock time at which this record was merged
    #[serde(with = "crawl_time_format")]
    pub crawl_time: NaiveDateTime,

    /// Present only when the detail page was fetched
    #[serde(flatten)]
    pub detail: Option<ArticleDetail>,
}

impl ArticleRecord {
    /// Builds a record from a stub and its detail, stamping `crawl_time`
    pub fn merge(stub: ArticleStub, detail: Option<ArticleDetail>, crawl_time: NaiveDateTime) -> Self {
        Self {
            title: stub.title,
            url: stub.url,
            published_at: stub.published_at,
            summary: stub.summary,
            crawl_time,
            detail,
        }
    }

    /// Returns true if a detail page was fetched for this record
    pub fn is_enriched(&self) -> bool {
        self.detail.is_some()
    }

    /// Article body, empty for stub-only records
    pub fn content(&self) -> &str {
        self.detail.as_ref().map(|d| d.body.as_str()).unwrap_or("")
    }

    /// Best known publish time: the detail page's, else the listing's
    pub fn best_published_at(&self) -> Option<&PublishedAt> {
        self.detail
            .as_ref()
            .and_then(|d| d.published_at.as_ref())
            .or(self.published_at.as_ref())
    }

    /// Returns true if the record carries enough text for sentiment analysis
    ///
    /// A title of at least 5 characters and content of at least 20.
    pub fn is_analyzable(&self) -> bool {
        self.title.chars().count() >= 5 && self.content().chars().count() >= 20
    }

    /// The `{title, content}` view consumed by the sentiment analyzer
    pub fn sentiment_input(&self) -> SentimentInput<'_> {
        SentimentInput {
            title: &self.title,
            content: self.content(),
        }
    }
}

/// Input record for the sentiment-analysis engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SentimentInput<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

/// Counts describing one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Listing pages fetched successfully
    pub pages_fetched: u32,

    /// Unique stubs kept after deduplication
    pub stubs_found: usize,

    /// Listing entries dropped as duplicates
    pub duplicates_dropped: usize,

    /// Listing items skipped for a missing title or URL
    pub items_skipped: usize,

    /// Detail fetches attempted
    pub details_attempted: usize,

    /// Detail fetches that returned a page
    pub details_succeeded: usize,

    /// URLs whose detail fetch failed
    pub failed_details: Vec<String>,
}

impl CrawlSummary {
    /// Detail fetches that failed
    pub fn details_failed(&self) -> usize {
        self.details_attempted - self.details_succeeded
    }
}

/// The records and counts of one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    pub records: Vec<ArticleRecord>,
    pub summary: CrawlSummary,
}

impl CrawlResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Sentiment inputs for every record with enough text to analyze
    pub fn sentiment_inputs(&self) -> Vec<SentimentInput<'_>> {
        self.records
            .iter()
            .filter(|record| record.is_analyzable())
            .map(ArticleRecord::sentiment_input)
            .collect()
    }
}
