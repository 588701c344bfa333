//! Prometheus metrics for the sigdrop server.
//!
//! Exposes upload outcomes, published volume and verification latency.
//!
//! # Security Note
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! It exposes no identifiers or paths, only aggregate counts. Restrict it to
//! scraper addresses at the network level or disable it with
//! `server.metrics_enabled = false`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Upload outcome metrics
pub static UPLOADS_ACCEPTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sigdrop_uploads_accepted_total",
        "Total number of upload batches verified and published",
    )
    .expect("metric creation failed")
});

pub static UPLOADS_REJECTED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "sigdrop_uploads_rejected_total",
            "Total number of upload batches rejected, by reason",
        ),
        &["reason"],
    )
    .expect("metric creation failed")
});

pub static UPLOADS_IN_FLIGHT: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "sigdrop_uploads_in_flight",
        "Current number of upload requests being processed",
    )
    .expect("metric creation failed")
});

// Publish metrics
pub static FILES_PUBLISHED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sigdrop_files_published_total",
        "Total number of files published",
    )
    .expect("metric creation failed")
});

pub static BYTES_PUBLISHED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sigdrop_bytes_published_total",
        "Total bytes published",
    )
    .expect("metric creation failed")
});

// Timing metrics
pub static VERIFICATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "sigdrop_batch_verification_duration_seconds",
            "Time taken to verify every signature in a batch",
        )
        .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(UPLOADS_ACCEPTED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOADS_REJECTED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOADS_IN_FLIGHT.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(FILES_PUBLISHED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(BYTES_PUBLISHED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(VERIFICATION_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// Handler for the `/metrics` endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Helper to record rejected uploads by reason.
pub fn record_upload_rejected(reason: &str) {
    UPLOADS_REJECTED.with_label_values(&[reason]).inc();
}

/// Tracks one upload in [`UPLOADS_IN_FLIGHT`] for as long as it is alive.
pub struct InFlightGuard(());

impl InFlightGuard {
    pub fn new() -> Self {
        UPLOADS_IN_FLIGHT.inc();
        Self(())
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        UPLOADS_IN_FLIGHT.dec();
    }
}
