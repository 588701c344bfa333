//! Integration tests for the non-upload endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestServer, UploadBody};
use serde_json::json;
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let (status, body) = server.send(get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "OK"}));
}

#[tokio::test]
async fn test_upload_requires_post() {
    let server = TestServer::new().await;

    let (status, _) = server.send(get("/api/upload")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_upload_requires_multipart() {
    let server = TestServer::new().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"identifier":"alice@example.com"}"#))
        .unwrap();
    let (status, body) = server.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap_or_default();
    assert!(message.contains("multipart/form-data"), "{body}");
    assert_eq!(body.as_object().map(|o| o.len()), Some(1), "{body}");
    assert!(server.temp_entries().is_empty());
}

#[tokio::test]
async fn test_metrics_exposed_when_enabled() {
    let server = TestServer::new().await;

    let request = UploadBody::new()
        .target("alice@example.com", "metrics1")
        .signed_file("a.txt", b"a", "alice@example.com")
        .into_request("/api/upload");
    assert_eq!(server.send(request).await.0, StatusCode::OK);

    let response = server.router.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("sigdrop_uploads_accepted_total"), "{text}");
    assert!(text.contains("sigdrop_files_published_total"));
    assert!(text.contains("sigdrop_batch_verification_duration_seconds"));
}

#[tokio::test]
async fn test_metrics_hidden_when_disabled() {
    let server = TestServer::with_config(|config| config.server.metrics_enabled = false).await;

    let (status, _) = server.send(get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
