//! CSV output
//!
//! UTF-8 with a byte-order mark so spreadsheet tools pick the right
//! encoding. Tags are joined with `|` into a single column.

use crate::models::{published_text, ArticleDetail, ArticleRecord, PublishedAt, TIMESTAMP_FORMAT};
use crate::output::traits::{OutputError, OutputResult, RecordWriter};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const BOM: &str = "\u{feff}";

const TAG_SEPARATOR: char = '|';

/// One CSV row; field order is the column order
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    title: String,
    url: String,
    time: String,
    summary: String,
    crawl_time: String,
    content: String,
    publish_time: String,
    author: String,
    tags: String,
}

impl From<&ArticleRecord> for CsvRow {
    fn from(record: &ArticleRecord) -> Self {
        let detail = record.detail.as_ref();
        Self {
            title: record.title.clone(),
            url: record.url.clone(),
            time: published_text(&record.published_at),
            summary: record.summary.clone(),
            crawl_time: record.crawl_time.format(TIMESTAMP_FORMAT).to_string(),
            content: record.content().to_string(),
            publish_time: detail
                .map(|d| published_text(&d.published_at))
                .unwrap_or_default(),
            author: detail.and_then(|d| d.author.clone()).unwrap_or_default(),
            tags: detail
                .map(|d| d.tags.join(&TAG_SEPARATOR.to_string()))
                .unwrap_or_default(),
        }
    }
}

impl TryFrom<CsvRow> for ArticleRecord {
    type Error = OutputError;

    fn try_from(row: CsvRow) -> Result<Self, Self::Error> {
        let crawl_time = NaiveDateTime::parse_from_str(&row.crawl_time, TIMESTAMP_FORMAT)
            .map_err(|e| OutputError::Malformed(format!("crawl_time '{}': {}", row.crawl_time, e)))?;

        let has_detail = !(row.content.is_empty()
            && row.publish_time.is_empty()
            && row.author.is_empty()
            && row.tags.is_empty());

        let detail = has_detail.then(|| ArticleDetail {
            title: None,
            body: row.content,
            published_at: PublishedAt::parse(&row.publish_time),
            author: Some(row.author).filter(|a| !a.is_empty()),
            tags: row
                .tags
                .split(TAG_SEPARATOR)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        });

        Ok(Self {
            title: row.title,
            url: row.url,
            published_at: PublishedAt::parse(&row.time),
            summary: row.summary,
            crawl_time,
            detail,
        })
    }
}

/// Writes records as BOM-prefixed CSV
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter;

impl RecordWriter for CsvWriter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write_records(&self, records: &[ArticleRecord], out: &mut dyn Write) -> OutputResult<()> {
        out.write_all(BOM.as_bytes())?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer.write_record([
            "title",
            "url",
            "time",
            "summary",
            "crawl_time",
            "content",
            "publish_time",
            "author",
            "tags",
        ])?;
        for record in records {
            writer.serialize(CsvRow::from(record))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Reads a CSV file written by [`CsvWriter`]
///
/// The detail-page headline is not a CSV column, so enriched records come
/// back with `detail.title == None`.
pub fn read_records<R: Read>(mut reader: R) -> OutputResult<Vec<ArticleRecord>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let text = text.strip_prefix(BOM).unwrap_or(&text);

    csv::Reader::from_reader(text.as_bytes())
        .deserialize::<CsvRow>()
        .map(|row| ArticleRecord::try_from(row?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleStub;
    use chrono::NaiveDate;

    fn crawl_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 30, 0))
            .unwrap()
    }

    fn stub(title: &str, time: &str) -> ArticleStub {
        ArticleStub {
            title: title.to_string(),
            url: format!("https://gold.fx678.com/content/{}.shtml", title.len()),
            published_at: PublishedAt::parse(time),
            summary: "摘要, 含逗号".to_string(),
        }
    }

    #[test]
    fn test_header_and_bom() {
        let mut out = Vec::new();
        CsvWriter.write_records(&[], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "\u{feff}title,url,time,summary,crawl_time,content,publish_time,author,tags\n"
        );
    }

    #[test]
    fn test_tags_are_pipe_joined() {
        let detail = ArticleDetail {
            body: "正文\n第二段".to_string(),
            tags: vec!["黄金".to_string(), "美联储".to_string()],
            ..ArticleDetail::default()
        };
        let record = ArticleRecord::merge(stub("金价", "2024-05-01"), Some(detail), crawl_time());

        let mut out = Vec::new();
        CsvWriter.write_records(&[record], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("黄金|美联储"));
        assert!(text.contains("\"摘要, 含逗号\""));
    }

    #[test]
    fn test_read_back_preserves_records() {
        let detail = ArticleDetail {
            title: None,
            body: "正文\n第二段".to_string(),
            published_at: PublishedAt::parse("2024-05-01 09:15:00"),
            author: Some("李明".to_string()),
            tags: vec!["黄金".to_string(), "美联储".to_string()],
        };
        let records = vec![
            ArticleRecord::merge(stub("金价", "2024-05-01 10:00"), Some(detail), crawl_time()),
            ArticleRecord::merge(stub("美元走弱", "05-01 10:00"), None, crawl_time()),
            ArticleRecord::merge(stub("无时间", ""), None, crawl_time()),
        ];

        let mut out = Vec::new();
        CsvWriter.write_records(&records, &mut out).unwrap();
        let back = read_records(out.as_slice()).unwrap();

        assert_eq!(back, records);
    }

    #[test]
    fn test_bad_crawl_time_is_malformed() {
        let text = "title,url,time,summary,crawl_time,content,publish_time,author,tags\n\
                    a,https://x.com/,,,yesterday,,,,\n";
        let err = read_records(text.as_bytes()).unwrap_err();
        assert!(matches!(err, OutputError::Malformed(_)));
    }
}
