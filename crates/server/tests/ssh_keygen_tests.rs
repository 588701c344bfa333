//! End-to-end uploads through the subprocess verifier.
#![cfg(unix)]

mod common;

use axum::http::StatusCode;
use common::UploadBody;
use serde_json::{Value, json};
use sigdrop_core::config::AppConfig;
use sigdrop_server::{AppState, create_router};
use sigdrop_signer::{SignerRegistry, SshKeygenVerifier};
use sigdrop_storage::Publisher;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Stand-in for `ssh-keygen -Y verify`: accepts when the signature file holds
/// the exact message bytes, the namespace is `file` and the identity is alice.
const FAKE_SSH_KEYGEN: &str = r#"#!/bin/sh
[ "$1" = "-Y" ] && [ "$2" = "verify" ] && [ "$5" = "-n" ] && [ "$6" = "file" ] || exit 2
grep -q "^${10} " "$4" || exit 3
payload=$(cat)
expected=$(cat "$8")
[ "$payload" = "$expected" ]
"#;

async fn setup() -> (TempDir, AppConfig, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::for_testing(dir.path());
    std::fs::create_dir_all(&config.storage.temp_dir).unwrap();
    std::fs::write(
        &config.signing.allowed_signers,
        "alice@example.com ssh-ed25519 AAAA\n",
    )
    .unwrap();

    let program = dir.path().join("fake-ssh-keygen");
    std::fs::write(&program, FAKE_SSH_KEYGEN).unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
    config.signing.program = program;

    let registry = SignerRegistry::load(&config.signing.allowed_signers)
        .await
        .unwrap();
    let verifier = Arc::new(SshKeygenVerifier::new(
        config.signing.program.clone(),
        registry,
    ));
    let publisher = Publisher::new(&config.storage.upload_path).await.unwrap();

    let state = AppState::new(config.clone(), verifier, publisher);
    (dir, config, create_router(state))
}

async fn send(router: &axum::Router, body: UploadBody) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(body.into_request("/api/upload"))
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_accepted_by_verification_program() {
    let (_dir, config, router) = setup().await;

    let body = UploadBody::new()
        .target("alice@example.com", "build42")
        .file("report.txt", b"quarterly numbers")
        .signature("report.txt.sig", b"quarterly numbers")
        .file("data.csv", b"1,2,3")
        .signature("data.csv.sig", b"1,2,3");
    let (status, response) = send(&router, body).await;

    assert_eq!(status, StatusCode::OK, "{response}");
    let destination = config.storage.upload_path.join("build42");
    assert!(destination.join("report.txt").is_file());
    assert!(destination.join("data.csv").is_file());
    let alias = config.storage.alias_root().unwrap().join("alice@example.com");
    assert_eq!(std::fs::read_link(alias).unwrap(), destination);
}

#[tokio::test]
async fn test_unknown_identity_rejected_by_verification_program() {
    let (_dir, config, router) = setup().await;

    let body = UploadBody::new()
        .target("mallory@example.com", "build42")
        .file("report.txt", b"quarterly numbers")
        .signature("report.txt.sig", b"quarterly numbers");
    let (status, response) = send(&router, body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, json!({"error": "Error verifying file signature"}));
    assert!(!config.storage.upload_path.join("build42").exists());
    assert_eq!(
        std::fs::read_dir(&config.storage.temp_dir).unwrap().count(),
        0
    );
}

#[tokio::test]
async fn test_missing_program_is_verification_failure() {
    let (dir, mut config, _) = setup().await;
    config.signing.program = dir.path().join("no-such-program");

    let registry = SignerRegistry::load(&config.signing.allowed_signers)
        .await
        .unwrap();
    let verifier = Arc::new(SshKeygenVerifier::new(
        config.signing.program.clone(),
        registry,
    ));
    let publisher = Publisher::new(&config.storage.upload_path).await.unwrap();
    let router = create_router(AppState::new(config.clone(), verifier, publisher));

    let body = UploadBody::new()
        .target("alice@example.com", "build42")
        .file("report.txt", b"data")
        .signature("report.txt.sig", b"data");
    let (status, response) = send(&router, body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, json!({"error": "Error verifying file signature"}));
}
