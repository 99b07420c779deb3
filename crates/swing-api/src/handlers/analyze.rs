//! Video upload handler.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use swing_models::{JobKind, JobStatus};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use crate::storage::{new_swing_id, video_extension, ALLOWED_EXTENSIONS};

/// Multipart field carrying the video.
const VIDEO_FIELD: &str = "video";

/// Response when a video is accepted for analysis.
#[derive(Debug, Serialize)]
pub struct JobSubmitResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
}

/// POST /api/v1/analyze
///
/// Store the uploaded swing video and queue it for analysis. Returns
/// immediately with the job ID to poll.
///
/// Returns:
/// - 202: Job queued
/// - 400: Missing `video` field or unsupported file type
/// - 413: Upload exceeds the body limit
/// - 503: Queue is shutting down
pub async fn submit_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<JobSubmitResponse>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let ext = video_extension(&filename).ok_or_else(|| {
            ApiError::bad_request(format!(
                "Invalid file type. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

        let swing_id = new_swing_id();
        let (path, size) = state.uploads.save_field(&swing_id, &ext, field).await?;
        metrics::record_upload_bytes(size);

        let path = tokio::fs::canonicalize(&path).await.unwrap_or(path);
        let job = match state
            .queue
            .submit(path.to_string_lossy().into_owned(), swing_id.as_str(), JobKind::User)
            .await
        {
            Ok(job) => job,
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), "Failed to remove rejected upload: {}", rm);
                }
                return Err(e.into());
            }
        };

        info!(
            job_id = %job.job_id,
            swing_id = %swing_id,
            filename = %filename,
            size,
            "Video uploaded for analysis"
        );

        let response = JobSubmitResponse {
            message: format!("Video uploaded for analysis (Job ID: {})", job.job_id),
            job_id: job.job_id.to_string(),
            status: job.status,
        };
        return Ok((StatusCode::ACCEPTED, Json(response)));
    }

    Err(ApiError::bad_request(format!(
        "Missing '{}' file field",
        VIDEO_FIELD
    )))
}
