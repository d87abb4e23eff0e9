//! Statistics over a persisted dataset
//!
//! Backs the `--inspect` mode: a saved JSON file is loaded and summarized
//! without re-crawling.

use crate::models::ArticleRecord;
use chrono::NaiveDateTime;
use std::path::Path;

/// Dataset statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetStatistics {
    /// Total number of records
    pub total: usize,

    /// Records that carry a detail page
    pub enriched: usize,

    /// Records with a non-empty body
    pub with_body: usize,

    /// Records with an author
    pub with_author: usize,

    /// Records that pass the sentiment-analysis length checks
    pub analyzable: usize,

    /// Earliest parseable publish time
    pub earliest: Option<NaiveDateTime>,

    /// Latest parseable publish time
    pub latest: Option<NaiveDateTime>,
}

impl DatasetStatistics {
    /// Computes statistics for a set of records
    pub fn from_records(records: &[ArticleRecord]) -> Self {
        let times: Vec<NaiveDateTime> = records
            .iter()
            .filter_map(|r| r.best_published_at().and_then(|p| p.timestamp()))
            .collect();

        Self {
            total: records.len(),
            enriched: records.iter().filter(|r| r.is_enriched()).count(),
            with_body: records.iter().filter(|r| !r.content().is_empty()).count(),
            with_author: records
                .iter()
                .filter(|r| r.detail.as_ref().is_some_and(|d| d.author.is_some()))
                .count(),
            analyzable: records.iter().filter(|r| r.is_analyzable()).count(),
            earliest: times.iter().min().copied(),
            latest: times.iter().max().copied(),
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DatasetStatistics, source: &Path) {
    println!("=== Dataset Statistics ===\n");
    println!("File: {}\n", source.display());

    println!("Records:");
    println!("  Total: {}", stats.total);
    println!("  With detail page: {}", stats.enriched);
    println!("  With body text: {}", stats.with_body);
    println!("  With author: {}", stats.with_author);
    println!("  Ready for sentiment analysis: {}", stats.analyzable);
    println!();

    match (stats.earliest, stats.latest) {
        (Some(earliest), Some(latest)) => {
            println!("Time Range:");
            println!("  Earliest: {}", earliest);
            println!("  Latest: {}", latest);
        }
        _ => println!("Time Range: no parseable publish times"),
    }
}
