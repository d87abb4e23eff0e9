use url::Url;

/// Resolves an href to an absolute HTTP(S) URL
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel:, data: schemes
/// - hrefs that do not resolve against the base
/// - non-HTTP(S) URLs after resolution
///
/// # Example
///
/// ```
/// use gold_news_crawler::links::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://gold.fx678.com").unwrap();
/// assert_eq!(
///     resolve_link("/content/20240501.shtml", &base).as_deref(),
///     Some("https://gold.fx678.com/content/20240501.shtml")
/// );
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
