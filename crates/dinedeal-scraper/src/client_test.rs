use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn test_client() -> PageClient {
    PageClient::new(5, "dinedeal-test/0.1").expect("failed to build test PageClient")
}

#[test]
fn host_of_lowercases_and_keeps_port() {
    assert_eq!(
        host_of("https://WWW.Zomato.com/hyderabad/cafe").as_deref(),
        Some("www.zomato.com")
    );
    assert_eq!(
        host_of("http://127.0.0.1:8080/page").as_deref(),
        Some("127.0.0.1:8080")
    );
}

#[test]
fn host_of_rejects_unparsable_urls() {
    assert!(host_of("not a url").is_none());
    assert!(host_of("/relative/path").is_none());
    assert!(host_of("").is_none());
}

#[tokio::test]
async fn fetch_page_returns_body_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cafe"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Flat 20% off</html>"))
        .mount(&server)
        .await;

    let body = test_client()
        .fetch_page(&format!("{}/cafe", server.uri()))
        .await
        .unwrap();
    assert!(body.contains("Flat 20% off"));
}

#[tokio::test]
async fn fetch_page_maps_429_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_page(&format!("{}/cafe", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScraperError::RateLimited { status: 429, .. }),
        "expected RateLimited(429), got: {err:?}"
    );
    assert_eq!(err.http_status(), Some(429));
}

#[tokio::test]
async fn fetch_page_maps_403_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_page(&format!("{}/cafe", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::RateLimited { status: 403, .. }));
}

#[tokio::test]
async fn fetch_page_maps_500_to_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_page(&format!("{}/cafe", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScraperError::UnexpectedStatus { status: 500, .. }
    ));
}

#[tokio::test]
async fn fetch_page_timeout_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>late</html>")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = PageClient::new(1, "dinedeal-test/0.1").expect("failed to build test PageClient");
    let err = client
        .fetch_page(&format!("{}/cafe", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScraperError::Http(ref e) if e.is_timeout()),
        "expected Http timeout, got: {err:?}"
    );
    assert_eq!(err.http_status(), None);
}

#[tokio::test]
async fn fetch_json_rejects_non_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_json(&format!("{}/data.json", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::Deserialize { .. }));
}

#[tokio::test]
async fn fetch_json_treats_429_as_plain_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_json(&format!("{}/data.json", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScraperError::UnexpectedStatus { status: 429, .. }
    ));
}
