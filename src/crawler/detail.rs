//! Article detail page parser
//!
//! Extracts the headline, body text, publish time, author and tags from a
//! single article page. Every field is best-effort: a page where nothing can
//! be located still yields an [`ArticleDetail`] with an empty body.

use crate::crawler::listing::collapse_whitespace;
use crate::models::{ArticleDetail, PublishedAt};
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Headline selectors, most specific first
const TITLE_SELECTORS: &[&str] = &[
    "h1[class*=title], h1[class*=headline], h2[class*=title], h2[class*=headline]",
    "h1, h2",
    ".title, .headline, .news-title",
    "[class*=title], [class*=headline]",
];

/// Body container selectors, most specific first
const CONTENT_SELECTORS: &[&str] = &[
    ".nyl_main",
    ".content, .article-content, .news-content, .text-content",
    "[class*=content], [class*=article], [class*=text]",
    "article, .article, #article",
    ".main-content, .post-content, .entry-content",
];

const TIME_SELECTORS: &[&str] = &[
    ".nyl_article",
    "[class*=time], [class*=date], [class*=publish]",
    "time, .time, .date, .publish-time, .post-time",
    "[id*=time], [id*=date]",
];

const AUTHOR_SELECTORS: &[&str] = &[
    ".nyl_article",
    ".author, .writer, .by-author",
    "[class*=author], [class*=writer]",
];

const TAG_SELECTORS: &[&str] = &[".tags a, .tag a, .keywords a, [class*=tag] a"];

/// Elements whose text never belongs to the article body
const NOISE_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "iframe", "form", "noscript",
];

/// Class fragments marking ads and page furniture
const NOISE_CLASS_FRAGMENTS: &[&str] = &["advert", "share", "related", "comment", "sidebar", "social"];

/// Markers of promotional blocks; a container containing one is rejected
const PROMO_MARKERS: &[&str] = &["广告", "推广", "点击查看"];

/// Generic channel names that are never a real headline
const GENERIC_TITLES: &[&str] = &["黄金频道", "汇通财经", "汇通网"];

/// A container body shorter than this is treated as navigation residue
const MIN_CONTAINER_CHARS: usize = 200;

/// Paragraphs shorter than this are dropped in the fallback extraction
const MIN_PARAGRAPH_CHARS: usize = 20;

/// Longest text accepted as an author name
const MAX_AUTHOR_CHARS: usize = 50;

/// Parser for article detail pages
#[derive(Debug)]
pub struct DetailParser {
    title: Vec<Selector>,
    content: Vec<Selector>,
    time: Vec<Selector>,
    author: Vec<Selector>,
    tags: Vec<Selector>,
    paragraph: Option<Selector>,
    keywords_meta: Option<Selector>,
}

impl Default for DetailParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailParser {
    pub fn new() -> Self {
        Self {
            title: compile_all(TITLE_SELECTORS),
            content: compile_all(CONTENT_SELECTORS),
            time: compile_all(TIME_SELECTORS),
            author: compile_all(AUTHOR_SELECTORS),
            tags: compile_all(TAG_SELECTORS),
            paragraph: Selector::parse("p").ok(),
            keywords_meta: Selector::parse("meta[name=keywords]").ok(),
        }
    }

    /// Parses an article page
    ///
    /// Never fails: missing containers leave the corresponding field empty.
    pub fn parse_detail(&self, html: &str) -> ArticleDetail {
        let document = Html::parse_document(html);

        ArticleDetail {
            title: self.extract_title(&document),
            body: self.extract_body(&document),
            published_at: self.extract_publish_time(&document),
            author: self.extract_author(&document),
            tags: self.extract_tags(&document),
        }
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        self.title
            .iter()
            .filter_map(|selector| document.select(selector).next())
            .map(|el| strip_site_suffix(&collapse_whitespace(&el.text().collect::<String>())))
            .find(|title| !title.is_empty())
    }

    /// Extracts the article text
    ///
    /// The first content container with enough text and no promotional
    /// markers wins. Otherwise substantial paragraphs that are not
    /// copyright/source disclaimers are joined with blank lines.
    fn extract_body(&self, document: &Html) -> String {
        for selector in &self.content {
            let Some(container) = document.select(selector).next() else {
                continue;
            };

            let mut raw = String::new();
            collect_text(container, &mut raw);
            let text = collapse_whitespace(&raw);

            if text.chars().count() > MIN_CONTAINER_CHARS
                && !PROMO_MARKERS.iter().any(|marker| text.contains(marker))
            {
                return text;
            }
        }

        let Some(paragraph) = &self.paragraph else {
            return String::new();
        };

        document
            .select(paragraph)
            .filter(|p| !has_noise_ancestor(*p))
            .map(|p| collapse_whitespace(&p.text().collect::<String>()))
            .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
            .filter(|text| !disclaimer_pattern().is_match(text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn extract_publish_time(&self, document: &Html) -> Option<PublishedAt> {
        self.time
            .iter()
            .filter_map(|selector| document.select(selector).next())
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .find_map(|text| {
                timestamp_pattern()
                    .find(&text)
                    .or_else(|| page_date_pattern().find(&text))
                    .and_then(|m| PublishedAt::parse(m.as_str()))
            })
    }

    fn extract_author(&self, document: &Html) -> Option<String> {
        self.author
            .iter()
            .filter_map(|selector| document.select(selector).next())
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .find_map(|text| author_from_text(&text))
    }

    fn extract_tags(&self, document: &Html) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        let mut push = |tag: &str| {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|existing| existing == tag) {
                tags.push(tag.to_string());
            }
        };

        if let Some(meta) = &self.keywords_meta {
            for element in document.select(meta) {
                if let Some(content) = element.value().attr("content") {
                    content
                        .split(|c: char| matches!(c, ',' | '，' | '、' | ';' | '；'))
                        .for_each(&mut push);
                }
            }
        }

        for selector in &self.tags {
            for element in document.select(selector) {
                push(&collapse_whitespace(&element.text().collect::<String>()));
            }
        }

        tags
    }
}

/// Returns true if the detail page headline should replace the listing title
pub fn is_meaningful_title(title: &str) -> bool {
    let title = title.trim();
    !title.is_empty() && !GENERIC_TITLES.contains(&title)
}

fn compile_all(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|selector| Selector::parse(selector).ok())
        .collect()
}

/// Appends the text of `element` to `out`, skipping noise subtrees
///
/// Block-level boundaries become spaces so adjacent paragraphs do not fuse.
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_noise(child_el) {
                    continue;
                }
                let block = matches!(
                    el.name(),
                    "p" | "div" | "br" | "li" | "h1" | "h2" | "h3" | "h4" | "section" | "tr"
                );
                if block {
                    out.push(' ');
                }
                collect_text(child_el, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Returns true for script/navigation elements and ad-like classes
fn is_noise(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if NOISE_TAGS.contains(&value.name()) {
        return true;
    }

    value.classes().any(|class| {
        let class = class.to_ascii_lowercase();
        class == "ad"
            || class.starts_with("ad-")
            || class.starts_with("ad_")
            || class.ends_with("-ad")
            || NOISE_CLASS_FRAGMENTS
                .iter()
                .any(|fragment| class.contains(fragment))
    })
}

fn has_noise_ancestor(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(is_noise)
}

/// Pulls an author name out of a byline such as `作者：李明 2024-05-01`
fn author_from_text(text: &str) -> Option<String> {
    static LABELLED: OnceLock<Regex> = OnceLock::new();
    static LEADING: OnceLock<Regex> = OnceLock::new();

    let labelled =
        LABELLED.get_or_init(|| Regex::new(r"作者[:：]\s*([^\s\d|｜]+)").expect("valid author regex"));
    if let Some(captures) = labelled.captures(text) {
        return Some(captures[1].to_string());
    }

    let leading = LEADING.get_or_init(|| Regex::new(r"^([^\d]+)").expect("valid byline regex"));
    let candidate = leading
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    let candidate = candidate
        .strip_prefix("By ")
        .or_else(|| candidate.strip_prefix("by "))
        .unwrap_or(&candidate)
        .trim()
        .to_string();

    if candidate.is_empty() || candidate.chars().count() >= MAX_AUTHOR_CHARS {
        None
    } else {
        Some(candidate)
    }
}

/// Removes trailing site names such as `-汇通网` from a headline
fn strip_site_suffix(title: &str) -> String {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"\s*[-_|｜]\s*[^-_|｜]*汇通网.*$").expect("valid suffix regex"));
    pattern.replace(title, "").trim().to_string()
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\d{4}[-/]\d{2}[-/]\d{2}\s+\d{2}:\d{2}(:\d{2})?").expect("valid timestamp regex")
    })
}

fn page_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{4}[-/]\d{1,2}[-/]\d{1,2}").expect("valid date regex"))
}

fn disclaimer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"版权|转载|来源|责任编辑|免责声明").expect("valid disclaimer regex"))
}
