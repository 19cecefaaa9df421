//! Integration tests for the fetcher
//!
//! These tests use wiremock to stand up local HTTP servers and exercise the
//! full fetch path: cache, throttle, retries and outcome classification.

use courier::cache::{MemoryCache, SqliteCache};
use courier::config::FetcherConfig;
use courier::{FetchOutcome, FetchRequest, Fetcher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fetcher with an in-memory cache and the given politeness delay
fn create_test_fetcher(delay_secs: f64) -> Fetcher {
    let config = FetcherConfig {
        user_agent: "TestBot/1.0".to_string(),
        delay_secs,
        timeout_secs: 5.0,
        max_retries: 3,
        proxies: Vec::new(),
    };
    Fetcher::new(config, Arc::new(MemoryCache::new()), Duration::from_secs(60))
        .expect("Failed to create fetcher")
}

#[tokio::test]
async fn test_success_is_returned_and_cached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>page</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(0.0);
    let url = format!("{}/page", mock_server.uri());

    let first = fetcher.get(&url, 3).await.unwrap();
    assert_eq!(first.outcome(), FetchOutcome::Success);
    assert_eq!(first.status_code(), Some(200));
    assert_eq!(first.body(), Some("<html>page</html>"));
    assert!(!first.from_cache());
    assert_eq!(first.attempts(), 1);

    // Served from the cache: the mock expects exactly one request
    let second = fetcher.get(&url, 3).await.unwrap();
    assert!(second.from_cache());
    assert_eq!(second.body(), first.body());
    assert_eq!(second.status_code(), Some(200));
}

#[tokio::test]
async fn test_server_errors_are_retried_until_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(0.0);
    let result = fetcher
        .get(&format!("{}/flaky", mock_server.uri()), 2)
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.body(), Some("recovered"));
    assert_eq!(result.attempts(), 3);
}

#[tokio::test]
async fn test_server_error_after_retries_exhausted() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(0.0);
    let result = fetcher
        .get(&format!("{}/down", mock_server.uri()), 2)
        .await
        .unwrap();

    assert_eq!(result.outcome(), FetchOutcome::ServerError);
    assert_eq!(result.status_code(), Some(500));
    assert_eq!(result.body(), None);
    assert_eq!(result.attempts(), 3);
}

#[tokio::test]
async fn test_zero_retries_means_single_attempt() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(0.0);
    let result = fetcher
        .get(&format!("{}/gateway", mock_server.uri()), 0)
        .await
        .unwrap();

    assert_eq!(result.outcome(), FetchOutcome::ServerError);
    assert_eq!(result.attempts(), 1);
}

#[tokio::test]
async fn test_client_error_is_not_retried_or_cached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(0.0);
    let url = format!("{}/missing", mock_server.uri());

    let result = fetcher.get(&url, 3).await.unwrap();
    assert_eq!(result.outcome(), FetchOutcome::ClientError);
    assert_eq!(result.status_code(), Some(404));
    assert_eq!(result.body(), None);
    assert_eq!(result.attempts(), 1);

    // A second call goes to the network again
    let again = fetcher.get(&url, 3).await.unwrap();
    assert!(!again.from_cache());
    assert!(fetcher.cache().is_empty().unwrap());
}

#[tokio::test]
async fn test_network_error_has_no_status() {
    // Reserve a port, then close it so connections are refused
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let fetcher = create_test_fetcher(0.0);
    let result = fetcher
        .get(&format!("http://127.0.0.1:{}/", port), 3)
        .await
        .unwrap();

    assert_eq!(result.outcome(), FetchOutcome::NetworkError);
    assert_eq!(result.status_code(), None);
    assert_eq!(result.body(), None);
    assert_eq!(result.attempts(), 1);
}

#[tokio::test]
async fn test_timeout_is_a_network_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(0.0);
    let request = FetchRequest::new(
        format!("{}/slow", mock_server.uri()),
        Duration::from_millis(300),
    );
    let result = fetcher.fetch(&request, 3).await.unwrap();

    assert_eq!(result.outcome(), FetchOutcome::NetworkError);
    assert_eq!(result.attempts(), 1);
}

#[tokio::test]
async fn test_request_headers_are_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/custom"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("custom"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/default"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("default"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(0.0);

    let request = FetchRequest::new(
        format!("{}/custom", mock_server.uri()),
        Duration::from_secs(5),
    )
    .header("X-Api-Key", "secret");
    let custom = fetcher.fetch(&request, 0).await.unwrap();
    assert_eq!(custom.body(), Some("custom"));

    let default = fetcher
        .get(&format!("{}/default", mock_server.uri()), 0)
        .await
        .unwrap();
    assert_eq!(default.body(), Some("default"));
}

#[tokio::test]
async fn test_same_peer_requests_are_spaced() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let delay = Duration::from_millis(500);
    let fetcher = create_test_fetcher(delay.as_secs_f64());
    let base = mock_server.uri();

    let start = Instant::now();
    fetcher.get(&format!("{}/a", base), 0).await.unwrap();
    fetcher.get(&format!("{}/b", base), 0).await.unwrap();
    assert!(start.elapsed() >= delay);

    // A cache hit does not wait on the throttle
    let hit_start = Instant::now();
    let hit = fetcher.get(&format!("{}/a", base), 0).await.unwrap();
    assert!(hit.from_cache());
    assert!(hit_start.elapsed() < delay / 2);
}

#[tokio::test]
async fn test_different_peers_do_not_wait_on_each_other() {
    let first_server = MockServer::start().await;
    let second_server = MockServer::start().await;
    for server in [&first_server, &second_server] {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(server)
            .await;
    }

    let delay = Duration::from_secs(2);
    let fetcher = create_test_fetcher(delay.as_secs_f64());

    // Same host, different ports: separate peers
    let start = Instant::now();
    fetcher.get(&first_server.uri(), 0).await.unwrap();
    fetcher.get(&second_server.uri(), 0).await.unwrap();
    assert!(start.elapsed() < delay);
    assert_eq!(fetcher.throttle().peer_count(), 2);
}

#[tokio::test]
async fn test_sqlite_cache_survives_fetcher_restart() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("persisted"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cache.db");
    let url = format!("{}/doc#section", mock_server.uri());
    let config = FetcherConfig {
        delay_secs: 0.0,
        ..FetcherConfig::default()
    };

    {
        let cache = Arc::new(SqliteCache::open(&db_path).unwrap());
        let fetcher = Fetcher::new(config.clone(), cache, Duration::from_secs(60)).unwrap();
        let result = fetcher.get(&url, 0).await.unwrap();
        assert!(!result.from_cache());
    }

    let cache = Arc::new(SqliteCache::open(&db_path).unwrap());
    let fetcher = Fetcher::new(config, cache, Duration::from_secs(60)).unwrap();
    let result = fetcher
        .get(&format!("{}/doc", mock_server.uri()), 0)
        .await
        .unwrap();

    assert!(result.from_cache());
    assert_eq!(result.body(), Some("persisted"));
}
