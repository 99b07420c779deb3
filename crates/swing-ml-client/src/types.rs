//! Inference service request/response types.

use serde::{Deserialize, Serialize};
use swing_models::JobKind;

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL_CODE: &str = "T01";

/// Request to analyze one swing video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeSwingRequest {
    /// Path to the uploaded video, readable by the service
    pub video_path: String,
    /// Swing ID echoed back in the analysis
    pub swing_id: String,
    /// User or pro swing
    pub user_type: JobKind,
    /// Inference model to run
    pub model_code: String,
}

impl AnalyzeSwingRequest {
    pub fn new(video_path: impl Into<String>, swing_id: impl Into<String>, user_type: JobKind) -> Self {
        Self {
            video_path: video_path.into(),
            swing_id: swing_id.into(),
            user_type,
            model_code: DEFAULT_MODEL_CODE.to_string(),
        }
    }

    /// Select a different model.
    pub fn with_model(mut self, model_code: impl Into<String>) -> Self {
        self.model_code = model_code.into();
        self
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}
