//! Service info and health check handlers.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use swing_models::JobStats;

use crate::state::AppState;

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "SwingSymphony API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "submit": "POST /api/v1/analyze",
            "status": "GET /api/v1/jobs/{job_id}",
            "wait": "GET /api/v1/jobs/{job_id}/wait",
            "stats": "GET /api/v1/stats",
        }
    }))
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub queue: JobStats,
}

/// Health check endpoint (liveness probe).
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        queue: state.queue.stats().await,
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub executor: CheckStatus,
    pub inference: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn ok(latency_ms: Option<u64>) -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
            latency_ms,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
            latency_ms: None,
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Readiness check endpoint (readiness probe).
/// Requires a running executor and a reachable inference service.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let executor_check = if state.executor.is_running().await {
        CheckStatus::ok(None)
    } else {
        CheckStatus::error("job executor is not running")
    };

    let inference_check = match &state.ml {
        Some(ml) => {
            let start = Instant::now();
            if ml.health_check().await.unwrap_or(false) {
                CheckStatus::ok(Some(start.elapsed().as_millis() as u64))
            } else {
                CheckStatus::error(format!(
                    "inference service unreachable at {}",
                    ml.config().base_url
                ))
            }
        }
        None => CheckStatus::error("inference service not configured"),
    };

    let all_ok = executor_check.is_ok() && inference_check.is_ok();
    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: ReadinessChecks {
            executor: executor_check,
            inference: inference_check,
        },
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
