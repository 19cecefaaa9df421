//! Integration tests for the crawl loop
//!
//! These tests use wiremock to create mock HTTP servers and drain real
//! queues end-to-end, including SQLite queues shared between workers.

use courier::cache::MemoryCache;
use courier::config::{load_config, FetcherConfig};
use courier::output::{PageArchive, INDEX_FILE_NAME};
use courier::queue::{MemoryQueue, SqliteQueue};
use courier::{CrawlLoop, Fetcher, WorkQueue};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fetcher without politeness delay backed by a memory cache
fn create_test_fetcher() -> Arc<Fetcher> {
    let config = FetcherConfig {
        user_agent: "TestBot/1.0".to_string(),
        delay_secs: 0.0,
        timeout_secs: 5.0,
        max_retries: 1,
        proxies: Vec::new(),
    };
    Arc::new(
        Fetcher::new(config, Arc::new(MemoryCache::new()), Duration::from_secs(60))
            .expect("Failed to create fetcher"),
    )
}

/// Mounts `/page/<n>` returning "page <n>" for every n in `0..count`
async fn mount_pages(mock_server: &MockServer, count: usize) {
    for i in 0..count {
        Mock::given(method("GET"))
            .and(path(format!("/page/{}", i)))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("page {}", i)))
            .mount(mock_server)
            .await;
    }
}

fn page_urls(base: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}/page/{}", base, i)).collect()
}

#[tokio::test]
async fn test_crawl_drains_queue_and_calls_handler() {
    let mock_server = MockServer::start().await;
    mount_pages(&mock_server, 5).await;

    let queue = Arc::new(MemoryQueue::new());
    queue.push(&page_urls(&mock_server.uri(), 5)).unwrap();
    let crawl = CrawlLoop::new(queue.clone(), create_test_fetcher());

    let mut results = Vec::new();
    let mut handler = |body: Option<&str>, url: &str| -> anyhow::Result<()> {
        results.push((url.to_string(), body.map(str::to_string)));
        Ok(())
    };
    let stats = crawl.run(Some(&mut handler)).await.unwrap();

    assert_eq!(stats.processed, 5);
    assert_eq!(stats.succeeded, 5);
    assert_eq!(queue.len().unwrap(), 0);
    assert_eq!(results.len(), 5);
    for (i, (url, body)) in results.iter().enumerate() {
        assert!(url.ends_with(&format!("/page/{}", i)));
        assert_eq!(body.as_deref(), Some(format!("page {}", i).as_str()));
    }
}

#[tokio::test]
async fn test_crawl_without_handler() {
    let mock_server = MockServer::start().await;
    mount_pages(&mock_server, 3).await;

    let queue = Arc::new(MemoryQueue::new());
    queue.push(&page_urls(&mock_server.uri(), 3)).unwrap();
    let crawl = CrawlLoop::new(queue.clone(), create_test_fetcher());

    let stats = crawl.run(None).await.unwrap();

    assert_eq!(stats.processed, 3);
    assert!(queue.is_empty().unwrap());
}

#[tokio::test]
async fn test_failed_fetches_reach_handler_without_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let base = mock_server.uri();
    let queue = Arc::new(MemoryQueue::new());
    queue
        .push(&[
            format!("{}/missing", base),
            format!("{}/broken", base),
            format!("{}/ok", base),
        ])
        .unwrap();
    let crawl = CrawlLoop::new(queue, create_test_fetcher()).with_max_retries(1);

    let mut bodies = Vec::new();
    let mut handler = |body: Option<&str>, _url: &str| -> anyhow::Result<()> {
        bodies.push(body.map(str::to_string));
        Ok(())
    };
    let stats = crawl.run(Some(&mut handler)).await.unwrap();

    assert_eq!(bodies, vec![None, None, Some("fine".to_string())]);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.succeeded, 1);
}

#[tokio::test]
async fn test_handler_errors_do_not_abort_crawl() {
    let mock_server = MockServer::start().await;
    mount_pages(&mock_server, 4).await;

    let queue = Arc::new(MemoryQueue::new());
    queue.push(&page_urls(&mock_server.uri(), 4)).unwrap();
    let crawl = CrawlLoop::new(queue.clone(), create_test_fetcher());

    let mut calls = 0;
    let mut handler = |_body: Option<&str>, url: &str| -> anyhow::Result<()> {
        calls += 1;
        if url.ends_with("/page/1") {
            anyhow::bail!("cannot extract {}", url);
        }
        Ok(())
    };
    let stats = crawl.run(Some(&mut handler)).await.unwrap();

    assert_eq!(calls, 4);
    assert_eq!(stats.handler_errors, 1);
    assert!(queue.is_empty().unwrap());
}

#[tokio::test]
async fn test_workers_share_sqlite_queue_without_duplicates() {
    let mock_server = MockServer::start().await;
    mount_pages(&mock_server, 40).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("queue.db");
    let producer = SqliteQueue::open(&db_path, "crawl").unwrap();
    producer.push(&page_urls(&mock_server.uri(), 40)).unwrap();

    let queue = Arc::new(SqliteQueue::open(&db_path, "crawl").unwrap());
    let crawl = CrawlLoop::new(queue, create_test_fetcher());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let stats = crawl
        .run_workers(4, |_| {
            let seen = Arc::clone(&seen);
            Ok(move |body: Option<&str>, url: &str| -> anyhow::Result<()> {
                assert!(body.is_some());
                seen.lock().unwrap().push(url.to_string());
                Ok(())
            })
        })
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    let unique: HashSet<&String> = seen.iter().collect();
    assert_eq!(seen.len(), 40);
    assert_eq!(unique.len(), 40);
    assert_eq!(stats.processed, 40);
    assert!(producer.is_empty().unwrap());
}

#[tokio::test]
async fn test_crawl_from_config_archives_pages() {
    let mock_server = MockServer::start().await;
    mount_pages(&mock_server, 2).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let archive_dir = root.join("pages");
    let config_path = root.join("courier.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[fetcher]
user-agent = "TestBot/1.0"
delay-secs = 0.0

[cache]
database-path = "{cache}"

[queue]
database-path = "{queue}"
name = "archive-test"

[output]
directory = "{archive}"
"#,
            cache = root.join("cache.db").display(),
            queue = root.join("queue.db").display(),
            archive = archive_dir.display(),
        ),
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let crawl = CrawlLoop::from_config(&config).unwrap();
    let mut urls = page_urls(&mock_server.uri(), 2);
    urls.push(format!("{}/gone", mock_server.uri()));
    crawl.queue().push(&urls).unwrap();

    let mut archive = PageArchive::open(&archive_dir).unwrap();
    let stats = crawl.run(Some(&mut archive)).await.unwrap();

    assert_eq!(stats.processed, 3);
    assert_eq!(archive.saved(), 2);
    assert_eq!(
        std::fs::read_to_string(archive.page_path(&urls[1])).unwrap(),
        "page 1"
    );
    assert!(!archive.page_path(&urls[2]).exists());

    let index = std::fs::read_to_string(archive_dir.join(INDEX_FILE_NAME)).unwrap();
    assert_eq!(index.lines().count(), 2);

    // Second run over the same URLs is served from the persistent cache
    crawl.queue().push(&urls[..2]).unwrap();
    let stats = crawl.run(None).await.unwrap();
    assert_eq!(stats.cache_hits, 2);
}
