//! Listing page parser
//!
//! Turns one news index page into an ordered sequence of [`ArticleStub`]s.
//! Items are found by the configured link selector; each item's timestamp
//! and summary are looked up inside the smallest enclosing element that
//! holds no other article link.

use crate::config::SourceConfig;
use crate::links::resolve_link;
use crate::models::{ArticleStub, PublishedAt};
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// How many ancestor levels are searched for an item's container
const MAX_CONTAINER_DEPTH: usize = 3;

/// Stubs recovered from one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Items in page order (duplicates not yet removed)
    pub stubs: Vec<ArticleStub>,

    /// Items dropped for a missing title or URL
    pub skipped: usize,
}

impl ListingPage {
    /// Returns true if the page yielded no items at all
    ///
    /// Usually means the site layout changed and the selectors need updating.
    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty() && self.skipped == 0
    }
}

/// Parser for the source site's listing pages
#[derive(Debug)]
pub struct ListingParser {
    base_url: Url,
    link_selector: Selector,
    time_selector: Selector,
    summary_selector: Selector,
}

impl ListingParser {
    /// Compiles the listing selectors from the source configuration
    pub fn new(config: &SourceConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

        Ok(Self {
            base_url,
            link_selector: compile("link-selector", &config.link_selector)?,
            time_selector: compile("time-selector", &config.time_selector)?,
            summary_selector: compile("summary-selector", &config.summary_selector)?,
        })
    }

    /// Parses a listing page into article stubs
    ///
    /// # Extraction Rules
    ///
    /// - **title**: the link text, falling back to its `title` attribute
    /// - **url**: the link href resolved against the site base
    /// - **published_at**: the first time element in the item whose text
    ///   contains a date, else a `YYYYMMDD` run in the URL
    /// - **summary**: the first summary element in the item whose text
    ///   differs from the title
    ///
    /// Items without a title or a resolvable URL are skipped and counted.
    ///
    /// # Example
    ///
    /// ```
    /// use gold_news_crawler::config::SourceConfig;
    /// use gold_news_crawler::crawler::ListingParser;
    ///
    /// let parser = ListingParser::new(&SourceConfig::default()).unwrap();
    /// let html = r#"<ul><li><a href="/content/20240501.shtml">金价上涨</a></li></ul>"#;
    /// let page = parser.parse_listing(html);
    /// assert_eq!(page.stubs[0].url, "https://gold.fx678.com/content/20240501.shtml");
    /// ```
    pub fn parse_listing(&self, html: &str) -> ListingPage {
        let document = Html::parse_document(html);
        let mut page = ListingPage::default();

        // Thumbnail links share their URL with a titled link of the same item
        let titled_urls: HashSet<String> = document
            .select(&self.link_selector)
            .filter(|link| link_title(*link).is_some())
            .filter_map(|link| self.resolve(link))
            .collect();

        for link in document.select(&self.link_selector) {
            match self.extract_stub(link) {
                Some(stub) => page.stubs.push(stub),
                None if self
                    .resolve(link)
                    .is_some_and(|url| titled_urls.contains(&url)) =>
                {
                    tracing::trace!("Ignoring untitled companion link {:?}", link.value().attr("href"));
                }
                None => {
                    tracing::debug!(
                        "Skipping listing item without title or URL: {:?}",
                        link.value().attr("href")
                    );
                    page.skipped += 1;
                }
            }
        }

        page
    }

    /// Resolves a matched link's href against the site base
    fn resolve(&self, link: ElementRef<'_>) -> Option<String> {
        link.value()
            .attr("href")
            .and_then(|href| resolve_link(href, &self.base_url))
    }

    /// Builds a stub from one matched link element
    fn extract_stub(&self, link: ElementRef<'_>) -> Option<ArticleStub> {
        let url = self.resolve(link)?;
        let title = link_title(link)?;

        let container = self.item_container(link, &url);
        let published_at = container
            .and_then(|item| self.find_time(item))
            .or_else(|| date_from_url(&url));
        let summary = container
            .and_then(|item| self.find_summary(item, &title))
            .unwrap_or_default();

        Some(ArticleStub {
            title,
            url,
            published_at,
            summary,
        })
    }

    /// Finds the largest ancestor (up to [`MAX_CONTAINER_DEPTH`] levels) that
    /// links to no article other than `url`
    fn item_container<'a>(&self, link: ElementRef<'a>, url: &str) -> Option<ElementRef<'a>> {
        let mut container = None;
        let mut node = link.parent();

        for _ in 0..MAX_CONTAINER_DEPTH {
            let Some(element) = node.and_then(ElementRef::wrap) else {
                break;
            };
            let links_elsewhere = element
                .select(&self.link_selector)
                .any(|other| self.resolve(other).as_deref() != Some(url));
            if links_elsewhere {
                break;
            }
            container = Some(element);
            node = element.parent();
        }

        container
    }

    fn find_time(&self, item: ElementRef<'_>) -> Option<PublishedAt> {
        item.select(&self.time_selector)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .find(|text| date_pattern().is_match(text))
            .and_then(|text| PublishedAt::parse(&text))
    }

    fn find_summary(&self, item: ElementRef<'_>, title: &str) -> Option<String> {
        item.select(&self.summary_selector)
            .filter(|el| el.select(&self.link_selector).next().is_none())
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .find(|text| !text.is_empty() && text != title && !date_pattern().is_match(text))
    }
}

/// The link text, falling back to its `title` attribute
fn link_title(link: ElementRef<'_>) -> Option<String> {
    Some(collapse_whitespace(&link.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .or_else(|| {
            link.value()
                .attr("title")
                .map(collapse_whitespace)
                .filter(|t| !t.is_empty())
        })
}

/// Compiles a configured selector
fn compile(key: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("{} '{}': {:?}", key, selector, e)))
}

/// Dates as shown on listing pages: `2024-05-01`, `2024/5/1`, `05-01`
fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}[-/]\d{1,2}").expect("valid date regex")
    })
}

/// Extracts an 8-digit `YYYYMMDD` date from an article URL
fn date_from_url(url: &str) -> Option<PublishedAt> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"(\d{4})(\d{2})(\d{2})").expect("valid url date regex"));

    let captures = pattern.captures(url)?;
    PublishedAt::parse(&format!("{}-{}-{}", &captures[1], &captures[2], &captures[3]))
        .filter(|date| date.timestamp().is_some())
}

/// Trims and collapses runs of whitespace into single spaces
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
