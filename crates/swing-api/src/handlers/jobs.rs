//! Job status handlers.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use swing_models::{Job, JobId, JobStats, JobStatus, SwingAnalysis};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Job status response.
///
/// `result` and `error` are always present, as `null` when not set.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    pub message: String,
    pub result: Option<SwingAnalysis>,
    pub error: Option<String>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.job_id.to_string(),
            status: job.status,
            progress: job.progress,
            message: job.message,
            result: job.result,
            error: job.error,
        }
    }
}

/// Query parameters for the long-poll endpoint.
#[derive(Debug, Deserialize)]
pub struct WaitQuery {
    /// Max wait in seconds; the server default applies when absent.
    pub timeout: Option<f64>,
}

impl WaitQuery {
    /// Values too large for a `Duration` saturate; the queue clamps them to
    /// its configured maximum.
    fn timeout(&self) -> ApiResult<Option<Duration>> {
        match self.timeout {
            None => Ok(None),
            Some(secs) if secs.is_finite() && secs >= 0.0 => Ok(Some(
                Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX),
            )),
            Some(_) => Err(ApiError::bad_request(
                "timeout must be a non-negative number of seconds",
            )),
        }
    }
}

/// GET /api/v1/jobs/:job_id
///
/// Current snapshot of a job. 404 if the ID is unknown.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state.queue.get(&JobId::from_string(job_id)).await?;
    Ok(Json(job.into()))
}

/// GET /api/v1/jobs/:job_id/wait?timeout=<secs>
///
/// Long-poll until the job completes or fails, or the timeout elapses,
/// then return the latest snapshot. Waiting never affects the job.
pub async fn wait_for_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<WaitQuery>,
) -> ApiResult<Json<JobStatusResponse>> {
    let timeout = query.timeout()?;
    let job_id = JobId::from_string(job_id);
    debug!(job_id = %job_id, ?timeout, "Waiting for job");

    let job = state.queue.wait_for(&job_id, timeout).await?;
    Ok(Json(job.into()))
}

/// GET /api/v1/stats
pub async fn get_queue_stats(State(state): State<AppState>) -> Json<JobStats> {
    Json(state.queue.stats().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_query_timeout() {
        let query = WaitQuery { timeout: None };
        assert_eq!(query.timeout().unwrap(), None);

        let query = WaitQuery { timeout: Some(0.5) };
        assert_eq!(query.timeout().unwrap(), Some(Duration::from_millis(500)));

        let query = WaitQuery { timeout: Some(0.0) };
        assert_eq!(query.timeout().unwrap(), Some(Duration::ZERO));

        let query = WaitQuery { timeout: Some(1e300) };
        assert_eq!(query.timeout().unwrap(), Some(Duration::MAX));

        assert!(WaitQuery { timeout: Some(-1.0) }.timeout().is_err());
        assert!(WaitQuery { timeout: Some(f64::NAN) }.timeout().is_err());
        assert!(WaitQuery { timeout: Some(f64::INFINITY) }.timeout().is_err());
    }

    #[test]
    fn test_status_response_has_null_result_and_error() {
        let job = Job::new("/v.mp4", "swing-1", swing_models::JobKind::User);
        let json = serde_json::to_value(JobStatusResponse::from(job)).unwrap();

        assert_eq!(json["status"], "pending");
        assert_eq!(json["progress"], 0);
        assert_eq!(json["message"], "Job queued");
        assert!(json["result"].is_null());
        assert!(json["error"].is_null());
    }
}
