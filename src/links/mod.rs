//! Link handling for listing and detail pages
//!
//! This module resolves article hrefs against the site base and derives the
//! normalized key used to deduplicate articles within one crawl batch.

mod normalize;
mod resolve;

pub use normalize::dedup_key;
pub use resolve::resolve_link;
