#![cfg(feature = "imds")]

use iid_engine as ie;
use ie::ByteFetcher;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOC_PATH: &str = "/latest/dynamic/instance-identity/document";

fn fetcher_for(server: &MockServer, use_token: bool) -> ie::ImdsFetcher {
    let mut cfg = ie::ImdsConfig::secure_default();
    cfg.base_url = server.uri();
    cfg.use_token = use_token;
    ie::ImdsFetcher::new(cfg).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_uses_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/latest/api/token"))
        .and(header("X-aws-ec2-metadata-token-ttl-seconds", "21600"))
        .respond_with(ResponseTemplate::new(200).set_body_string("tok-123\n"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .and(header("X-aws-ec2-metadata-token", "tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"region\":\"eu-west-1\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, true);
    let body = fetcher.fetch(&fetcher.endpoints().document).unwrap();
    assert_eq!(body, b"{\"region\":\"eu-west-1\"}");
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_without_token_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, false);
    assert_eq!(fetcher.fetch(&fetcher.endpoints().document).unwrap(), b"{}");
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
}

#[cfg(not(feature = "imds_v1_fallback"))]
#[tokio::test(flavor = "multi_thread")]
async fn token_failure_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, true);
    let err = fetcher.fetch(&fetcher.endpoints().document).unwrap_err();
    assert!(matches!(err, ie::FetchError::Status { status: 403, .. }));
}

#[cfg(feature = "imds_v1_fallback")]
#[tokio::test(flavor = "multi_thread")]
async fn token_failure_falls_back_to_tokenless_get() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/latest/api/token"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, true);
    assert_eq!(fetcher.fetch(&fetcher.endpoints().document).unwrap(), b"{}");

    let requests = server.received_requests().await.unwrap();
    let get = requests.iter().find(|r| r.method.as_str() == "GET").unwrap();
    assert!(!get.headers.contains_key("X-aws-ec2-metadata-token"));
}

#[tokio::test(flavor = "multi_thread")]
async fn base_url_path_prefix_applies_to_token_and_resources() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/proxy/latest/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("tok-prefixed"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/proxy{DOC_PATH}")))
        .and(header("X-aws-ec2-metadata-token", "tok-prefixed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = ie::ImdsConfig::secure_default();
    cfg.base_url = format!("{}/proxy/", server.uri());
    let fetcher = ie::ImdsFetcher::new(cfg).unwrap();
    assert_eq!(fetcher.fetch(&fetcher.endpoints().document).unwrap(), b"{}");
}

#[tokio::test(flavor = "multi_thread")]
async fn non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, false);
    let err = fetcher.fetch(&fetcher.endpoints().pkcs7).unwrap_err();
    assert!(matches!(err, ie::FetchError::Status { status: 404, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_response_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'A'; 4096]))
        .mount(&server)
        .await;

    let mut cfg = ie::ImdsConfig::secure_default();
    cfg.base_url = server.uri();
    cfg.use_token = false;
    cfg.max_response_size = 1024;
    let fetcher = ie::ImdsFetcher::new(cfg).unwrap();
    let err = fetcher.fetch(&fetcher.endpoints().signature).unwrap_err();
    assert!(matches!(err, ie::FetchError::TooLarge { limit: 1024, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn foreign_origin_is_refused() {
    let server = MockServer::start().await;
    let fetcher = fetcher_for(&server, true);
    let err = fetcher.fetch("http://127.0.0.2:9/latest/dynamic/instance-identity/document").unwrap_err();
    assert!(matches!(err, ie::FetchError::InvalidUri(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test]
fn public_endpoint_rejected_by_default() {
    let mut cfg = ie::ImdsConfig::secure_default();
    cfg.base_url = "http://metadata.example.com".into();
    assert!(matches!(ie::ImdsFetcher::new(cfg).unwrap_err(), ie::EngineError::Config(_)));
}
