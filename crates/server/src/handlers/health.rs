//! Health endpoint.

use axum::Json;
use serde::Serialize;

/// Status body shared by successful responses.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "OK" }
    }
}

/// GET /api/health
pub async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}
