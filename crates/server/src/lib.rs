//! HTTP surface for sigdrop.
//!
//! This crate provides:
//! - The signed batch upload endpoint
//! - Request validation and error mapping
//! - Health and Prometheus metrics endpoints

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
