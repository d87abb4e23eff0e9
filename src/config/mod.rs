//! Configuration module for the gold news crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A missing file is not required: [`Config::default`] describes the fx678
//! gold news channel and every key in a file overrides one default.
//!
//! # Example
//!
//! ```no_run
//! use gold_news_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Listing page: {}", config.source.listing_page_url(1));
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, OutputConfig, SourceConfig, TransportConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
