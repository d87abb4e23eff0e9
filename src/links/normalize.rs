use crate::{LinkError, LinkResult};
use url::Url;

/// Tracking query parameters that never identify a different article
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "source", "from", "spm"];

/// Derives the deduplication key for an absolute article URL
///
/// Two listing entries refer to the same article when their keys are equal.
/// The key is the URL with:
///
/// 1. scheme and host lowercased, `www.` removed
/// 2. the fragment removed
/// 3. dot segments, duplicate slashes and a trailing slash removed from the path
/// 4. tracking parameters (`utm_*` and [`TRACKING_PARAMS`]) removed and the
///    remaining query parameters sorted
///
/// The scheme is kept: `http://` and `https://` links stay distinct.
///
/// # Examples
///
/// ```
/// use gold_news_crawler::links::dedup_key;
///
/// let a = dedup_key("https://WWW.fx678.com/content/1/?utm_source=x#c").unwrap();
/// let b = dedup_key("https://fx678.com/content/1").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn dedup_key(url_str: &str) -> LinkResult<String> {
    let mut url = Url::parse(url_str).map_err(|e| LinkError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(LinkError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(LinkError::MissingHost)?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| LinkError::Parse(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            let query_string = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query_string));
        }
    }

    Ok(url.to_string())
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Drops tracking parameters and sorts the rest by key
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();
    params
}
