//! Tests for the data fetcher against a local HTTP server.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use jet_common::JetError;
use jetstream::fetch::{partial_path, EMAIL_HEADER, KEY_HEADER};
use jetstream::{
    Credentials, Fetcher, ProviderConfig, RequestDescriptor, RequestOptions, Resolver,
};
use test_utils::{temp_test_dir, HTML_ERROR_PAGE};

const PAYLOAD: &[u8] = b"CDF\x01 pretend this is a dataset";

#[derive(Clone, Default)]
struct Seen {
    query: Arc<Mutex<HashMap<String, String>>>,
    headers: Arc<Mutex<HashMap<String, String>>>,
}

async fn ok_handler(
    State(seen): State<Seen>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> &'static [u8] {
    *seen.query.lock().unwrap() = query;
    let mut captured = seen.headers.lock().unwrap();
    for (name, value) in headers.iter() {
        captured.insert(
            name.as_str().to_ascii_lowercase(),
            value.to_str().unwrap_or_default().to_string(),
        );
    }
    PAYLOAD
}

async fn unavailable_handler() -> (StatusCode, &'static [u8]) {
    (StatusCode::SERVICE_UNAVAILABLE, HTML_ERROR_PAGE)
}

async fn empty_handler() -> &'static str {
    ""
}

/// Serve the test routes on an ephemeral port; returns the base URL.
async fn spawn_server(seen: Seen) -> String {
    let app = Router::new()
        .route("/ok", get(ok_handler))
        .route("/unavailable", get(unavailable_handler))
        .route("/empty", get(empty_handler))
        .with_state(seen);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn provider(endpoint: String) -> ProviderConfig {
    ProviderConfig {
        endpoint: Some(endpoint),
        request_timeout_secs: Some(10),
        ..Default::default()
    }
}

fn request(provider: &ProviderConfig, scratch_dir: &Path) -> RequestDescriptor {
    let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
    Resolver::new(provider, today)
        .resolve(&RequestOptions::for_date("2018-04-29", scratch_dir))
        .unwrap()
}

fn assert_no_leftovers(req: &RequestDescriptor) {
    assert!(!req.scratch_path().exists(), "scratch file left behind");
    assert!(
        !partial_path(req.scratch_path()).exists(),
        "partial file left behind"
    );
}

// ============================================================================
// Successful downloads
// ============================================================================

#[tokio::test]
async fn test_fetch_writes_scratch_file() {
    let seen = Seen::default();
    let base = spawn_server(seen.clone()).await;
    let dir = temp_test_dir();
    let provider = provider(format!("{}/ok", base));
    let req = request(&provider, &dir.path().join("cache"));

    let outcome = Fetcher::new(&provider).unwrap().fetch(&req).await.unwrap();

    assert_eq!(outcome.path, req.scratch_path());
    assert_eq!(outcome.bytes, PAYLOAD.len() as u64);
    assert_eq!(std::fs::read(&outcome.path).unwrap(), PAYLOAD);
    assert!(!partial_path(&outcome.path).exists());

    let query = seen.query.lock().unwrap();
    assert_eq!(query.get("date").map(String::as_str), Some("2018-04-29/to/2018-04-29"));
    assert_eq!(query.get("param").map(String::as_str), Some("131.128/132.128"));
    assert_eq!(query.get("format").map(String::as_str), Some("netcdf"));

    let headers = seen.headers.lock().unwrap();
    assert!(!headers.contains_key(&KEY_HEADER.to_ascii_lowercase()));
}

#[tokio::test]
async fn test_fetch_sends_credentials() {
    let seen = Seen::default();
    let base = spawn_server(seen.clone()).await;
    let dir = temp_test_dir();
    let provider = ProviderConfig {
        credentials: Some(Credentials {
            url: None,
            key: "secret-key".to_string(),
            email: "someone@example.org".to_string(),
        }),
        ..provider(format!("{}/ok", base))
    };
    let req = request(&provider, dir.path());

    Fetcher::new(&provider).unwrap().fetch(&req).await.unwrap();

    let headers = seen.headers.lock().unwrap();
    assert_eq!(
        headers.get(&KEY_HEADER.to_ascii_lowercase()).map(String::as_str),
        Some("secret-key")
    );
    assert_eq!(
        headers.get(&EMAIL_HEADER.to_ascii_lowercase()).map(String::as_str),
        Some("someone@example.org")
    );
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_non_success_status_is_fetch_error() {
    let base = spawn_server(Seen::default()).await;
    let dir = temp_test_dir();
    let provider = provider(format!("{}/unavailable", base));
    let req = request(&provider, dir.path());

    let err = Fetcher::new(&provider).unwrap().fetch(&req).await.unwrap_err();
    assert!(matches!(err, JetError::Fetch(_)), "{:?}", err);
    assert!(err.to_string().contains("503"));
    assert_no_leftovers(&req);
}

#[tokio::test]
async fn test_missing_route_is_fetch_error() {
    let base = spawn_server(Seen::default()).await;
    let dir = temp_test_dir();
    let provider = provider(format!("{}/no-such-dataset", base));
    let req = request(&provider, dir.path());

    let err = Fetcher::new(&provider).unwrap().fetch(&req).await.unwrap_err();
    assert!(matches!(err, JetError::Fetch(_)));
    assert_no_leftovers(&req);
}

#[tokio::test]
async fn test_empty_body_is_fetch_error() {
    let base = spawn_server(Seen::default()).await;
    let dir = temp_test_dir();
    let provider = provider(format!("{}/empty", base));
    let req = request(&provider, dir.path());

    let err = Fetcher::new(&provider).unwrap().fetch(&req).await.unwrap_err();
    assert!(matches!(err, JetError::Fetch(_)));
    assert_no_leftovers(&req);
}

#[tokio::test]
async fn test_connection_refused_is_fetch_error() {
    // Bind and release a port so nothing is listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = temp_test_dir();
    let provider = provider(format!("http://{}/ok", addr));
    let req = request(&provider, dir.path());

    let err = Fetcher::new(&provider).unwrap().fetch(&req).await.unwrap_err();
    assert!(matches!(err, JetError::Fetch(_)));
    assert_no_leftovers(&req);
}
