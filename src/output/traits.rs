//! Output writer traits and types
//!
//! This module defines the trait interface for record writers and the
//! per-format outcome of a save call.

use crate::models::ArticleRecord;
use serde::Deserialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("No saved data file found in {0}")]
    NoDataFile(PathBuf),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Which persisted formats a run writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    Json,
    Csv,
    #[default]
    Both,
}

impl SaveFormat {
    pub fn includes_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }

    pub fn includes_csv(self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Outcome of one save call
///
/// Each requested format carries its own result; `None` means the format
/// was not requested. A failed format never affects the other.
#[derive(Debug, Default)]
pub struct SaveReport {
    pub json: Option<OutputResult<PathBuf>>,
    pub csv: Option<OutputResult<PathBuf>>,
}

impl SaveReport {
    /// Paths of every file written successfully
    pub fn saved_paths(&self) -> Vec<&Path> {
        [&self.json, &self.csv]
            .into_iter()
            .filter_map(|outcome| outcome.as_ref()?.as_ref().ok())
            .map(PathBuf::as_path)
            .collect()
    }

    /// Failures keyed by format name
    pub fn errors(&self) -> Vec<(&'static str, &OutputError)> {
        [("json", &self.json), ("csv", &self.csv)]
            .into_iter()
            .filter_map(|(name, outcome)| match outcome {
                Some(Err(e)) => Some((name, e)),
                _ => None,
            })
            .collect()
    }

    /// Returns true if every requested format was written
    pub fn is_complete(&self) -> bool {
        self.errors().is_empty()
    }
}

/// Trait for persisted record formats
///
/// Writers serialize a whole batch to any byte sink; the caller owns the
/// file handling and naming.
pub trait RecordWriter {
    /// File extension without the leading dot
    fn extension(&self) -> &'static str;

    /// Serializes `records` into `out`
    fn write_records(&self, records: &[ArticleRecord], out: &mut dyn Write) -> OutputResult<()>;
}
