//! HTTP fetcher behavior against a local mock server: status handling,
//! retry bounds and request identity.

use std::time::{Duration, Instant};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

use agroplant_scraper::config::HeaderConfig;
use agroplant_scraper::fetcher::{FetchError, HeaderPool, HttpFetcher, PageFetcher, RetryPolicy};

const TEST_AGENT: &str = "agroplant-test-agent/1.0";

fn fetcher(retries: usize, delay: Duration, timeout: Duration) -> HttpFetcher {
    let headers = HeaderConfig {
        base: [("Accept-Language".to_string(), "uk-UA".to_string())]
            .into_iter()
            .collect(),
        user_agents: vec![TEST_AGENT.to_string()],
    };

    HttpFetcher::new(
        RetryPolicy {
            retries,
            delay,
            timeout,
        },
        HeaderPool::new(&headers, Some(11)),
    )
    .expect("client should build")
}

#[tokio::test]
async fn test_ok_response_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uk/abakus"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>абакус</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let body = fetcher(3, Duration::from_millis(10), Duration::from_secs(5))
        .fetch(&format!("{}/uk/abakus", server.uri()))
        .await;

    assert_eq!(body.as_deref(), Some("<html>абакус</html>"));
}

#[tokio::test]
async fn test_non_200_is_skipped_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uk/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uk/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(3, Duration::from_millis(10), Duration::from_secs(5));

    let result = fetcher
        .fetch_detailed(&format!("{}/uk/missing", server.uri()))
        .await;
    assert!(result.document.is_none());
    assert!(matches!(result.error, Some(FetchError::Rejected { status: 404 })));

    let result = fetcher
        .fetch_detailed(&format!("{}/uk/broken", server.uri()))
        .await;
    assert!(matches!(result.error, Some(FetchError::Rejected { status: 503 })));
}

#[tokio::test]
async fn test_timeouts_exhaust_exactly_the_configured_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uk/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(2)),
        )
        .expect(3)
        .mount(&server)
        .await;

    let started = Instant::now();
    let result = fetcher(3, Duration::from_millis(50), Duration::from_millis(200))
        .fetch_detailed(&format!("{}/uk/slow", server.uri()))
        .await;

    assert!(result.document.is_none());
    match result.error {
        Some(FetchError::Transport { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected transport failure, got {:?}", other),
    }
    // Two sleeps between three attempts, none after the last
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_single_attempt_when_retries_is_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher(1, Duration::from_secs(5), Duration::from_millis(200))
        .fetch_detailed(&format!("{}/uk/slow", server.uri()))
        .await;

    assert!(matches!(
        result.error,
        Some(FetchError::Transport { attempts: 1, .. })
    ));
}

#[tokio::test]
async fn test_identity_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", TEST_AGENT))
        .and(header("accept-language", "uk-UA"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let body = fetcher(1, Duration::from_millis(10), Duration::from_secs(5))
        .fetch(&format!("{}/uk/abakus", server.uri()))
        .await;

    assert_eq!(body.as_deref(), Some("ok"));
}
