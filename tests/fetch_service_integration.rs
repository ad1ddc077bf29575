//! FetchService against a local HTTP server

use filterdeck::config::FetchConfig;
use filterdeck::services::{DataService, FetchEvent, FetchService};
use filterdeck::FilterDeckError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const RECORDS: &str = r#"[{"id": 1, "Name": "Ann"}, {"id": 2, "Name": "Bo"}]"#;

fn config() -> FetchConfig {
    FetchConfig {
        debounce_ms: 20,
        timeout_secs: 5,
    }
}

/// Serve canned responses by path until the test ends
async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(respond(stream));
        }
    });
    addr
}

async fn respond(mut stream: TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let head = String::from_utf8_lossy(&request);
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

    let (status, body) = match path.as_str() {
        "/records" => ("200 OK", RECORDS),
        "/garbage" => ("200 OK", "this is not json"),
        "/object" => ("200 OK", r#"{"Name": "Ann"}"#),
        "/slow" => {
            tokio::time::sleep(Duration::from_millis(300)).await;
            ("200 OK", r#"[{"Name": "Slow"}]"#)
        }
        _ => ("404 Not Found", r#"{"error": "not found"}"#),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Issue an immediate request and wait for its event
async fn fetch(path: &str) -> FetchEvent {
    let addr = start_server().await;
    let (mut service, mut rx) = FetchService::new(&config()).unwrap();
    let generation = service
        .request_immediate(&format!("http://{addr}{path}"))
        .unwrap();
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.generation, generation);
    event
}

#[tokio::test]
async fn test_immediate_request_decodes_array() {
    let event = fetch("/records").await;
    let body = event.outcome.unwrap();
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_non_success_status_is_fetch_failure() {
    let event = fetch("/missing").await;
    match event.outcome.unwrap_err() {
        FilterDeckError::FetchFailed(message) => assert!(message.contains("404"), "{message}"),
        other => panic!("expected FetchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_body_is_parse_failure() {
    let err = fetch("/garbage").await.outcome.unwrap_err();
    assert!(matches!(err, FilterDeckError::ParseFailed(_)));
    assert!(err.clears_data());
}

#[tokio::test]
async fn test_latest_request_wins() {
    let addr = start_server().await;
    let (mut service, mut rx) = FetchService::new(&config()).unwrap();

    let slow = service.request(&format!("http://{addr}/slow")).unwrap();
    let latest = service.request(&format!("http://{addr}/records")).unwrap();
    assert!(latest > slow);

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.generation, latest);
    assert!(service.is_current(event.generation));

    let mut session = DataService::new();
    session.apply_fetch_result_from(Some(&event.url), event.outcome).unwrap();
    assert_eq!(session.total_count(), 2);
    assert_eq!(
        session.dataset().and_then(|d| d.source.as_deref()),
        Some(format!("http://{addr}/records").as_str())
    );

    // The superseded request never reports
    let extra = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
    assert!(extra.is_err());
}

#[tokio::test]
async fn test_cancelled_in_flight_request_is_silent() {
    let addr = start_server().await;
    let (mut service, mut rx) = FetchService::new(&config()).unwrap();

    service.request(&format!("http://{addr}/slow")).unwrap();
    // Past the debounce, while the server is still sleeping
    tokio::time::sleep(Duration::from_millis(100)).await;
    service.cancel_pending();

    let extra = tokio::time::timeout(Duration::from_millis(600), rx.recv()).await;
    assert!(extra.is_err());
}

#[tokio::test]
async fn test_failed_fetch_clears_session() {
    let addr = start_server().await;
    let (mut service, mut rx) = FetchService::new(&config()).unwrap();
    let mut session = DataService::new();

    service.request(&format!("http://{addr}/records")).unwrap();
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    session.apply_fetch_result(event.outcome).unwrap();
    assert_eq!(session.total_count(), 2);

    service.request(&format!("http://{addr}/object")).unwrap();
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(session.apply_fetch_result(event.outcome).is_err());
    assert!(session.dataset().is_none());
    assert!(session.tree().is_empty());
    assert!(session.last_error().is_some());
}
