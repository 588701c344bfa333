//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check (unauthenticated for load balancers/k8s probes)
        .route("/api/health", get(handlers::health_check))
        .route(
            "/api/upload",
            post(handlers::upload_files)
                .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes)),
        );

    let mut router = Router::new().merge(api_routes);

    // SECURITY: when enabled, /metrics must be network-restricted.
    // See crate::metrics module documentation for details.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
