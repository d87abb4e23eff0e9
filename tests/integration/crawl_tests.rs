//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing and article pages and run the
//! full listing -> detail -> persistence pipeline end-to-end.

use gold_news_crawler::config::Config;
use gold_news_crawler::models::PublishedAt;
use gold_news_crawler::output::{read_csv, read_json, save_at};
use gold_news_crawler::{Coordinator, CrawlError, CrawlResult, FetchFailure, RunOptions, SaveFormat};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server, without delays
fn create_test_config(server: &MockServer, data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.source.base_url = server.uri();
    config.source.listing_url = format!("{}/goldNews/hj?p={{page}}", server.uri());
    config.transport.timeout_secs = 5;
    config.transport.max_attempts = 3;
    config.transport.backoff_base_ms = 1;
    config.transport.backoff_max_ms = 5;
    config.transport.jitter_ms = 0;
    config.crawl.detail_delay_ms = 0;
    config.crawl.page_delay_ms = 0;
    config.output.data_dir = data_dir.to_string_lossy().into_owned();
    config
}

/// Renders a listing page with one `<li>` per `(path, title, time)`
fn listing_html(items: &[(&str, &str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(href, title, time)| {
            format!(
                r#"<li><a href="{}">{}</a><span class="time">{}</span><p>{}的市场摘要</p></li>"#,
                href, title, time, title
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="header"><a href="/">首页</a></div>
        <ul class="news-list">{}</ul></body></html>"#,
        items
    )
}

fn article_html(title: &str) -> String {
    format!(
        r#"<html><head><meta name="keywords" content="黄金,美联储"></head><body>
        <h1 class="news-title">{}-汇通网</h1>
        <div class="nyl_article">作者：李明 2024-05-01 10:20:30</div>
        <div class="nyl_main"><p>{}</p></div></body></html>"#,
        title,
        "国际金价周三延续涨势，市场对美联储降息的预期持续升温。".repeat(10)
    )
}

async fn mount_listing(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/goldNews/hj"))
        .and(query_param("p", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn titles(result: &CrawlResult) -> Vec<&str> {
    result.records.iter().map(|r| r.title.as_str()).collect()
}

#[tokio::test]
async fn test_listing_only_crawl() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    mount_listing(
        &server,
        1,
        listing_html(&[
            ("/content/2024050101.shtml", "金价创下历史新高", "2024-05-01 10:20"),
            ("/content/2024050102.shtml", "美元指数走弱", "2024-05-01 09:00"),
        ]),
    )
    .await;

    let config = create_test_config(&server, temp.path());
    let options = RunOptions::from_config(&config);
    let coordinator = Coordinator::new(config).unwrap();
    let result = coordinator.collect(&options).await.unwrap();

    assert_eq!(titles(&result), vec!["金价创下历史新高", "美元指数走弱"]);
    let first = &result.records[0];
    assert_eq!(first.url, format!("{}/content/2024050101.shtml", server.uri()));
    assert_eq!(
        first.published_at.as_ref().map(|p| p.to_string()),
        Some("2024-05-01 10:20:00".to_string())
    );
    assert_eq!(first.summary, "金价创下历史新高的市场摘要");
    assert!(!first.is_enriched());
    assert_eq!(result.summary.pages_fetched, 1);
    assert_eq!(result.summary.details_attempted, 0);
}

#[tokio::test]
async fn test_duplicates_are_dropped_in_first_seen_order() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    mount_listing(
        &server,
        1,
        listing_html(&[
            ("/content/a.shtml", "第一篇", "2024-05-01"),
            ("/content/b.shtml", "第二篇", "2024-05-01"),
            ("/content/a.shtml#comments", "第一篇重复", "2024-05-01"),
            ("/content/c.shtml?utm_source=feed", "第三篇", "2024-05-01"),
            ("/content/c.shtml", "第三篇重复", "2024-05-01"),
        ]),
    )
    .await;

    let config = create_test_config(&server, temp.path());
    let options = RunOptions::from_config(&config);
    let result = Coordinator::new(config).unwrap().collect(&options).await.unwrap();

    assert_eq!(titles(&result), vec!["第一篇", "第二篇", "第三篇"]);
    assert_eq!(result.summary.stubs_found, 3);
    assert_eq!(result.summary.duplicates_dropped, 2);
}

#[tokio::test]
async fn test_transient_failures_below_limit_succeed() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/goldNews/hj"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_listing(
        &server,
        1,
        listing_html(&[("/content/a.shtml", "金价反弹", "2024-05-01")]),
    )
    .await;

    let config = create_test_config(&server, temp.path());
    let options = RunOptions::from_config(&config);
    let result = Coordinator::new(config).unwrap().collect(&options).await.unwrap();

    assert_eq!(titles(&result), vec!["金价反弹"]);
}

#[tokio::test]
async fn test_transient_failures_exhaust_attempts() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/goldNews/hj"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server, temp.path());
    let options = RunOptions::from_config(&config);
    let err = Coordinator::new(config)
        .unwrap()
        .collect(&options)
        .await
        .unwrap_err();

    match err {
        CrawlError::ListingFetch(e) => {
            assert_eq!(e.attempts, 3);
            assert_eq!(e.cause, FetchFailure::Status(502));
        }
    }
}

#[tokio::test]
async fn test_timeouts_are_retried_until_attempts_run_out() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/goldNews/hj"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_html(&[("/content/a.shtml", "迟到的新闻", "2024-05-01")]))
                .set_delay(Duration::from_millis(1500)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, temp.path());
    config.transport.timeout_secs = 1;
    config.transport.max_attempts = 2;
    let options = RunOptions::from_config(&config);
    let err = Coordinator::new(config)
        .unwrap()
        .collect(&options)
        .await
        .unwrap_err();

    let CrawlError::ListingFetch(e) = err;
    assert_eq!(e.attempts, 2);
    assert_eq!(e.cause, FetchFailure::Timeout);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    for status in [404u16, 403] {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/goldNews/hj"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let config = create_test_config(&server, temp.path());
        let options = RunOptions::from_config(&config);
        let err = Coordinator::new(config)
            .unwrap()
            .run(&options)
            .await
            .unwrap_err();

        let CrawlError::ListingFetch(e) = err;
        assert_eq!(e.attempts, 1);
        assert_eq!(e.cause, FetchFailure::Status(status));
        assert!(
            std::fs::read_dir(temp.path()).unwrap().next().is_none(),
            "a failed listing must not produce output files"
        );
    }
}

#[tokio::test]
async fn test_detail_failure_is_isolated() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    mount_listing(
        &server,
        1,
        listing_html(&[
            ("/content/1.shtml", "第一篇", "2024-05-01 08:00"),
            ("/content/2.shtml", "第二篇", "2024-05-01 09:00"),
            ("/content/3.shtml", "第三篇", "2024-05-01 10:00"),
        ]),
    )
    .await;
    for (page, title) in [("/content/1.shtml", "第一篇正文标题"), ("/content/3.shtml", "第三篇正文标题")] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_html(title)))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/content/2.shtml"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, temp.path());
    config.crawl.get_details = true;
    config.crawl.max_details = 3;
    let options = RunOptions::from_config(&config);
    let result = Coordinator::new(config).unwrap().collect(&options).await.unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(titles(&result), vec!["第一篇正文标题", "第二篇", "第三篇正文标题"]);
    assert!(result.records[0].is_enriched());
    assert!(!result.records[1].is_enriched());
    assert!(result.records[2].is_enriched());

    let detail = result.records[0].detail.as_ref().unwrap();
    assert!(detail.body.starts_with("国际金价周三延续涨势"));
    assert_eq!(detail.author.as_deref(), Some("李明"));
    assert_eq!(detail.tags, vec!["黄金", "美联储"]);

    assert_eq!(result.summary.details_attempted, 3);
    assert_eq!(result.summary.details_succeeded, 2);
    assert_eq!(
        result.summary.failed_details,
        vec![format!("{}/content/2.shtml", server.uri())]
    );
    assert_eq!(result.sentiment_inputs().len(), 2);
}

#[tokio::test]
async fn test_max_details_limits_detail_fetches() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    mount_listing(
        &server,
        1,
        listing_html(&[
            ("/content/1.shtml", "第一篇", "2024-05-01"),
            ("/content/2.shtml", "第二篇", "2024-05-01"),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/content/1.shtml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html("第一篇")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/content/2.shtml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html("第二篇")))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, temp.path());
    config.crawl.get_details = true;
    config.crawl.max_details = 1;
    let options = RunOptions::from_config(&config);
    let result = Coordinator::new(config).unwrap().collect(&options).await.unwrap();

    assert!(result.records[0].is_enriched());
    assert!(!result.records[1].is_enriched());
    assert_eq!(result.summary.details_attempted, 1);
}

#[tokio::test]
async fn test_empty_listing_is_a_successful_run() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    mount_listing(
        &server,
        1,
        "<html><body><p>系统维护中</p></body></html>".to_string(),
    )
    .await;

    let config = create_test_config(&server, temp.path());
    let mut options = RunOptions::from_config(&config);
    options.save_format = SaveFormat::Json;
    let report = Coordinator::new(config).unwrap().run(&options).await.unwrap();

    assert!(report.result.is_empty());
    assert_eq!(report.result.summary.pages_fetched, 1);
    let json_path = report.saved.json.unwrap().unwrap();
    assert_eq!(std::fs::read_to_string(json_path).unwrap(), "[]");
    assert!(report.saved.csv.is_none());
}

#[tokio::test]
async fn test_saved_files_round_trip() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    mount_listing(
        &server,
        1,
        listing_html(&[
            ("/content/1.shtml", "金价创下历史新高", "2024-05-01 10:20"),
            ("/content/2.shtml", "美元指数走弱", "05-01 09:00"),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/content/1.shtml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html("金价创下历史新高")))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, temp.path());
    config.crawl.get_details = true;
    config.crawl.max_details = 1;
    let options = RunOptions::from_config(&config);
    let report = Coordinator::new(config).unwrap().run(&options).await.unwrap();
    assert!(report.saved.is_complete());

    let key = |title: &str, url: &str, time: Option<&PublishedAt>| {
        (title.to_string(), url.to_string(), time.cloned())
    };
    let expected: Vec<_> = report
        .result
        .records
        .iter()
        .map(|r| key(&r.title, &r.url, r.published_at.as_ref()))
        .collect();

    let json_records = read_json(report.saved.json.as_ref().unwrap().as_ref().unwrap()).unwrap();
    let csv_records = read_csv(report.saved.csv.as_ref().unwrap().as_ref().unwrap()).unwrap();

    for records in [&json_records, &csv_records] {
        let actual: Vec<_> = records
            .iter()
            .map(|r| key(&r.title, &r.url, r.published_at.as_ref()))
            .collect();
        assert_eq!(actual, expected);
    }
    assert_eq!(json_records, report.result.records);
    assert_eq!(csv_records[0].content(), report.result.records[0].content());
}

#[test]
fn test_file_names_have_second_granularity() {
    let temp = TempDir::new().unwrap();
    let result = CrawlResult::default();
    let at = |s: u32| {
        chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_milli_opt(12, 0, s, 0))
            .unwrap()
    };
    let later_same_second = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_milli_opt(12, 0, 1, 900))
        .unwrap();

    let first = save_at(&result, SaveFormat::Json, temp.path(), at(1));
    let same = save_at(&result, SaveFormat::Json, temp.path(), later_same_second);
    let next = save_at(&result, SaveFormat::Json, temp.path(), at(2));

    let first = first.json.unwrap().unwrap();
    assert_eq!(first, same.json.unwrap().unwrap());
    assert_ne!(first, next.json.unwrap().unwrap());
}

#[tokio::test]
async fn test_pagination_stops_at_empty_page() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    mount_listing(
        &server,
        1,
        listing_html(&[
            ("/content/1.shtml", "第一篇", "2024-05-01"),
            ("/content/2.shtml", "第二篇", "2024-05-01"),
        ]),
    )
    .await;
    mount_listing(
        &server,
        2,
        listing_html(&[
            ("/content/2.shtml", "第二篇", "2024-05-01"),
            ("/content/3.shtml", "第三篇", "2024-04-30"),
        ]),
    )
    .await;
    mount_listing(&server, 3, listing_html(&[])).await;
    Mock::given(method("GET"))
        .and(path("/goldNews/hj"))
        .and(query_param("p", "4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, temp.path());
    config.crawl.max_pages = 5;
    let options = RunOptions::from_config(&config);
    let result = Coordinator::new(config).unwrap().collect(&options).await.unwrap();

    assert_eq!(titles(&result), vec!["第一篇", "第二篇", "第三篇"]);
    assert_eq!(result.summary.pages_fetched, 3);
    assert_eq!(result.summary.duplicates_dropped, 1);
}

#[tokio::test]
async fn test_later_page_failure_keeps_earlier_pages() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    mount_listing(
        &server,
        1,
        listing_html(&[("/content/1.shtml", "第一篇", "2024-05-01")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/goldNews/hj"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, temp.path());
    config.crawl.max_pages = 3;
    let options = RunOptions::from_config(&config);
    let result = Coordinator::new(config).unwrap().collect(&options).await.unwrap();

    assert_eq!(titles(&result), vec!["第一篇"]);
    assert_eq!(result.summary.pages_fetched, 1);
}

#[tokio::test]
async fn test_target_count_truncates_and_stops() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    mount_listing(
        &server,
        1,
        listing_html(&[
            ("/content/1.shtml", "第一篇", "2024-05-01"),
            ("/content/2.shtml", "第二篇", "2024-05-01"),
        ]),
    )
    .await;
    mount_listing(
        &server,
        2,
        listing_html(&[
            ("/content/3.shtml", "第三篇", "2024-05-01"),
            ("/content/4.shtml", "第四篇", "2024-05-01"),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/goldNews/hj"))
        .and(query_param("p", "3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, temp.path());
    config.crawl.max_pages = 10;
    config.crawl.target_count = Some(3);
    let options = RunOptions::from_config(&config);
    let result = Coordinator::new(config).unwrap().collect(&options).await.unwrap();

    assert_eq!(titles(&result), vec!["第一篇", "第二篇", "第三篇"]);
    assert_eq!(result.summary.stubs_found, 3);
    assert_eq!(result.summary.pages_fetched, 2);
}
