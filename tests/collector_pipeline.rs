//! End-to-end collection runs against a mocked upstream: fetch, parse,
//! deduplicate, persist, count.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use newsdesk::collector;
use newsdesk::entities::{NewScrapedItem, NewSource, ScrapedItem, Source, SourceKind, SourceUpdate};
use newsdesk::repositories::{ItemRepositoryTrait, SourceRepositoryTrait};
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// Source registry stub: remembers `touch_last_fetched` calls.
#[derive(Default)]
struct MemorySources {
    touched: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl SourceRepositoryTrait for MemorySources {
    async fn list(&self, _active_only: bool) -> Result<Vec<Source>> {
        Ok(Vec::new())
    }
    async fn get(&self, _id: Uuid) -> Result<Option<Source>> {
        Ok(None)
    }
    async fn create(&self, _source: NewSource) -> Result<Source> {
        Err(anyhow!("not supported in this test"))
    }
    async fn update(&self, _id: Uuid, _update: SourceUpdate) -> Result<Option<Source>> {
        Err(anyhow!("not supported in this test"))
    }
    async fn delete(&self, _id: Uuid) -> Result<bool> {
        Ok(false)
    }
    async fn touch_last_fetched(&self, id: Uuid) -> Result<()> {
        self.touched.lock().unwrap().push(id);
        Ok(())
    }
    async fn ensure_virtual(&self, _name: String) -> Result<Source> {
        Err(anyhow!("not supported in this test"))
    }
}

/// Item store stub enforcing `(source_id, original_url)` uniqueness.
#[derive(Default)]
struct MemoryItems {
    seen: Mutex<HashSet<(Uuid, String)>>,
}

impl MemoryItems {
    fn seed(&self, source_id: Uuid, url: &str) {
        self.seen.lock().unwrap().insert((source_id, url.to_string()));
    }

    fn stored_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ItemRepositoryTrait for MemoryItems {
    async fn insert_if_new(&self, item: NewScrapedItem) -> Result<Option<ScrapedItem>> {
        let key = (item.source_id, item.original_url.clone());
        if !self.seen.lock().unwrap().insert(key) {
            return Ok(None);
        }
        Ok(Some(ScrapedItem {
            id: Uuid::new_v4(),
            source_id: item.source_id,
            title: item.title,
            summary: item.summary,
            content: item.content,
            original_url: item.original_url,
            image_url: item.image_url,
            author: item.author,
            published_at: item.published_at,
            raw_metadata: item.raw_metadata,
            created_at: Utc::now(),
        }))
    }
    async fn get(&self, _id: Uuid) -> Result<Option<ScrapedItem>> {
        Ok(None)
    }
    async fn unclassified(&self, _limit: i64) -> Result<Vec<ScrapedItem>> {
        Ok(Vec::new())
    }
    async fn unclassified_count(&self) -> Result<i64> {
        Ok(0)
    }
    async fn count_for_source(&self, _source_id: Uuid) -> Result<i64> {
        Ok(0)
    }
    async fn in_range(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _source_ids: Option<Vec<Uuid>>,
        _limit: i64,
    ) -> Result<Vec<ScrapedItem>> {
        Ok(Vec::new())
    }
    async fn count_since(&self, _since: Option<DateTime<Utc>>) -> Result<i64> {
        Ok(0)
    }
}

fn rss_source(url: String, last_fetched_at: Option<DateTime<Utc>>) -> Source {
    Source {
        id: Uuid::new_v4(),
        name: "Example Feed".to_string(),
        url,
        kind: SourceKind::Rss,
        active: true,
        scraping_config: None,
        fetch_interval_secs: 3600,
        last_fetched_at,
        created_at: Utc::now(),
    }
}

const FEED_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example News</title>
    <item>
      <title>First story</title>
      <link>https://example.com/stories/first</link>
      <description>Alpha</description>
      <pubDate>Mon, 06 Jul 2026 10:30:00 GMT</pubDate>
    </item>
    <item>
      <title>Second story</title>
      <link>https://example.com/stories/second</link>
      <description>Beta</description>
    </item>
    <item>
      <title>Third story</title>
      <link>https://example.com/stories/third</link>
      <description>Gamma</description>
    </item>
  </channel>
</rss>"#;

#[tokio::test]
async fn rss_collection_counts_duplicates() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(FEED_BODY.as_bytes(), "application/rss+xml"),
        )
        .mount(&mock_server)
        .await;

    let source = rss_source(format!("{}/feed.xml", mock_server.uri()), None);
    let sources = MemorySources::default();
    let items = MemoryItems::default();
    // One of the three entries is already stored.
    items.seed(source.id, "https://example.com/stories/second");

    let outcome = collector::collect_source(&sources, &items, &source, false).await;

    assert_eq!(outcome.total_found, 3);
    assert_eq!(outcome.collected, 2);
    assert_eq!(outcome.duplicates_skipped, 1);
    assert!(outcome.error.is_none());
    assert!(!outcome.skipped);
    assert_eq!(items.stored_count(), 3);
    assert_eq!(sources.touched.lock().unwrap().as_slice(), &[source.id]);
}

#[tokio::test]
async fn collection_is_idempotent_across_runs() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(FEED_BODY.as_bytes(), "application/rss+xml"),
        )
        .mount(&mock_server)
        .await;

    let source = rss_source(format!("{}/feed.xml", mock_server.uri()), None);
    let sources = MemorySources::default();
    let items = MemoryItems::default();

    let first = collector::collect_source(&sources, &items, &source, false).await;
    assert_eq!(first.collected, 3);

    // Second forced run finds the same entries and stores nothing new.
    let second = collector::collect_source(&sources, &items, &source, true).await;
    assert_eq!(second.total_found, 3);
    assert_eq!(second.collected, 0);
    assert_eq!(second.duplicates_skipped, 3);
    assert_eq!(items.stored_count(), 3);
}

#[tokio::test]
async fn html_collection_extracts_blocks() {
    let page = r#"<html><body>
        <article><h2><a href="/local/one">Story one</a></h2><p>Summary one</p></article>
        <article><h2><a href="/local/two">Story two</a></h2></article>
    </body></html>"#;

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(page.as_bytes(), "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let mut source = rss_source(format!("{}/latest", mock_server.uri()), None);
    source.kind = SourceKind::Html;

    let sources = MemorySources::default();
    let items = MemoryItems::default();

    let outcome = collector::collect_source(&sources, &items, &source, false).await;

    assert_eq!(outcome.total_found, 2);
    assert_eq!(outcome.collected, 2);
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn blocked_page_is_reported_not_silent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    b"<html><title>Attention Required! | Cloudflare</title></html>".as_slice(),
                    "text/html",
                ),
        )
        .mount(&mock_server)
        .await;

    let mut source = rss_source(format!("{}/latest", mock_server.uri()), None);
    source.kind = SourceKind::Html;

    let sources = MemorySources::default();
    let items = MemoryItems::default();

    let outcome = collector::collect_source(&sources, &items, &source, false).await;

    assert_eq!(outcome.collected, 0);
    let error = outcome.error.expect("blocked fetch must surface an error");
    assert!(error.contains("blocked"));
    // A failed run does not advance the fetch clock.
    assert!(sources.touched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn politeness_window_suppresses_fetch() {
    let mock_server = MockServer::start().await;
    // Zero expected requests: the window check must short-circuit the fetch.
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let source = rss_source(
        format!("{}/feed.xml", mock_server.uri()),
        Some(Utc::now() - Duration::seconds(30)),
    );
    let sources = MemorySources::default();
    let items = MemoryItems::default();

    let outcome = collector::collect_source(&sources, &items, &source, false).await;

    assert!(outcome.skipped);
    assert_eq!(outcome.total_found, 0);
}
