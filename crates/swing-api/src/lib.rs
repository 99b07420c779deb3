//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video upload and job submission
//! - Job status polling and long-poll waits
//! - Queue statistics, health and readiness probes
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod storage;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use storage::UploadStore;
