//! Output module for persisting and inspecting crawl results
//!
//! This module handles:
//! - Writing a run's records as timestamped JSON and/or CSV files
//! - Reading persisted files back
//! - Computing statistics over a persisted dataset

mod csv_output;
mod json;
pub mod stats;
mod traits;

pub use csv_output::CsvWriter;
pub use json::JsonWriter;
pub use stats::{print_statistics, DatasetStatistics};
pub use traits::{OutputError, OutputResult, RecordWriter, SaveFormat, SaveReport};

use crate::models::{ArticleRecord, CrawlResult};
use chrono::{Local, NaiveDateTime};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Prefix shared by every persisted data file
pub const FILE_STEM_PREFIX: &str = "gold_news_";

/// Builds the file name for a save made at `timestamp`
///
/// Names have second resolution: two saves in the same second produce the
/// same name and the later one overwrites the earlier.
pub fn output_filename(timestamp: NaiveDateTime, extension: &str) -> String {
    format!(
        "{}{}.{}",
        FILE_STEM_PREFIX,
        timestamp.format("%Y%m%d_%H%M%S"),
        extension
    )
}

/// Persists a crawl result in the requested formats
///
/// One timestamp is taken per call, so the JSON and CSV files of a run
/// share a name. The directory is created if missing. An empty result is
/// still written (an empty array, a header-only CSV).
pub fn save(result: &CrawlResult, format: SaveFormat, output_dir: &Path) -> SaveReport {
    save_at(result, format, output_dir, Local::now().naive_local())
}

/// [`save`] with an explicit timestamp for the file names
pub fn save_at(
    result: &CrawlResult,
    format: SaveFormat,
    output_dir: &Path,
    timestamp: NaiveDateTime,
) -> SaveReport {
    let mut report = SaveReport::default();

    if format.includes_json() {
        report.json = Some(write_file(&JsonWriter, &result.records, output_dir, timestamp));
    }
    if format.includes_csv() {
        report.csv = Some(write_file(&CsvWriter, &result.records, output_dir, timestamp));
    }

    report
}

fn write_file(
    writer: &dyn RecordWriter,
    records: &[ArticleRecord],
    output_dir: &Path,
    timestamp: NaiveDateTime,
) -> OutputResult<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(output_filename(timestamp, writer.extension()));

    let mut out = BufWriter::new(File::create(&path)?);
    writer.write_records(records, &mut out)?;
    out.flush()?;

    tracing::debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(path)
}

/// Reads a JSON file written by [`save`]
pub fn read_json(path: &Path) -> OutputResult<Vec<ArticleRecord>> {
    json::read_records(BufReader::new(File::open(path)?))
}

/// Reads a CSV file written by [`save`]
pub fn read_csv(path: &Path) -> OutputResult<Vec<ArticleRecord>> {
    csv_output::read_records(BufReader::new(File::open(path)?))
}

/// Finds the newest `gold_news_*.json` file in a directory
///
/// File names embed the save time, so the lexicographically greatest name
/// is the most recent.
pub fn latest_json_file(dir: &Path) -> OutputResult<PathBuf> {
    let mut newest: Option<PathBuf> = None;

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_data_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(FILE_STEM_PREFIX) && name.ends_with(".json"));

        if is_data_file && newest.as_ref().map_or(true, |current| path > *current) {
            newest = Some(path);
        }
    }

    newest.ok_or_else(|| OutputError::NoDataFile(dir.to_path_buf()))
}
