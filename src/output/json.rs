//! JSON array output
//!
//! Records are written as one pretty-printed array (2-space indentation,
//! non-ASCII characters kept literal), the layout the downstream sentiment
//! and dashboard tools read.

use crate::models::ArticleRecord;
use crate::output::traits::{OutputResult, RecordWriter};
use std::io::{Read, Write};

/// Writes records as a JSON array
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter;

impl RecordWriter for JsonWriter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write_records(&self, records: &[ArticleRecord], out: &mut dyn Write) -> OutputResult<()> {
        serde_json::to_writer_pretty(out, records)?;
        Ok(())
    }
}

/// Reads a JSON array written by [`JsonWriter`]
pub fn read_records<R: Read>(reader: R) -> OutputResult<Vec<ArticleRecord>> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleDetail, ArticleStub, PublishedAt};
    use chrono::NaiveDate;

    fn record(detail: Option<ArticleDetail>) -> ArticleRecord {
        let crawl_time = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        ArticleRecord::merge(
            ArticleStub {
                title: "金价上涨".to_string(),
                url: "https://gold.fx678.com/content/1.shtml".to_string(),
                published_at: PublishedAt::parse("2024-05-01 10:00"),
                summary: String::new(),
            },
            detail,
            crawl_time,
        )
    }

    #[test]
    fn test_output_keeps_chinese_and_indents() {
        let mut out = Vec::new();
        JsonWriter.write_records(&[record(None)], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("[\n  {\n    \"title\": \"金价上涨\""));
        assert!(text.contains("\"time\": \"2024-05-01 10:00:00\""));
        assert!(text.contains("\"crawl_time\": \"2024-05-01 12:00:00\""));
        assert!(!text.contains("\"content\""));
    }

    #[test]
    fn test_enriched_record_fields() {
        let detail = ArticleDetail {
            title: Some("金价上涨".to_string()),
            body: "正文".to_string(),
            published_at: None,
            author: Some("李明".to_string()),
            tags: vec!["黄金".to_string()],
        };
        let mut out = Vec::new();
        JsonWriter.write_records(&[record(Some(detail.clone()))], &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["content"], "正文");
        assert_eq!(value[0]["author"], "李明");
        assert_eq!(value[0]["tags"][0], "黄金");
        assert_eq!(value[0]["detail_title"], "金价上涨");

        let back = read_records(out.as_slice()).unwrap();
        assert_eq!(back[0].detail, Some(detail));
    }

    #[test]
    fn test_empty_batch_is_empty_array() {
        let mut out = Vec::new();
        JsonWriter.write_records(&[], &mut out).unwrap();
        assert_eq!(out, b"[]");
        assert!(read_records(out.as_slice()).unwrap().is_empty());
    }
}
