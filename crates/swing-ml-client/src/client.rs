//! Inference service HTTP client.

use std::time::Duration;

use reqwest::Client;
use swing_models::SwingAnalysis;
use tracing::{debug, warn};
use validator::Validate;

use crate::error::{MlError, MlResult};
use crate::types::{AnalyzeSwingRequest, HealthResponse};

/// Configuration for ML client.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    /// Base URL of the inference service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(300), // 5 minutes for pose estimation
            max_retries: 2,
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ML_SERVICE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("ML_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_retries: std::env::var("ML_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Client for the pose-inference service.
#[derive(Clone)]
pub struct MlClient {
    http: Client,
    config: MlClientConfig,
}

impl MlClient {
    /// Create a new ML client.
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::new(MlClientConfig::from_env())
    }

    pub fn config(&self) -> &MlClientConfig {
        &self.config
    }

    /// Check if the inference service is healthy.
    pub async fn health_check(&self) -> MlResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("ML service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("ML service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Run swing analysis on an uploaded video.
    pub async fn analyze_swing(&self, request: &AnalyzeSwingRequest) -> MlResult<SwingAnalysis> {
        let url = format!("{}/analyze", self.config.base_url);

        debug!(
            swing_id = %request.swing_id,
            model = %request.model_code,
            "Sending swing analysis request to {}", url
        );

        let analysis = self
            .with_retry(|| self.post_analysis(&url, request))
            .await?;

        analysis
            .validate()
            .map_err(|e| MlError::InvalidResponse(e.to_string()))?;

        Ok(analysis)
    }

    async fn post_analysis(&self, url: &str, request: &AnalyzeSwingRequest) -> MlResult<SwingAnalysis> {
        let response = self.http.post(url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::from_status(status, body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice::<SwingAnalysis>(&bytes)
            .map_err(|e| MlError::InvalidResponse(e.to_string()))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MlResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MlResult<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "ML request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use swing_models::JobKind;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> MlClient {
        MlClient::new(MlClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            max_retries: 1,
        })
        .unwrap()
    }

    fn analysis_body() -> serde_json::Value {
        json!({
            "id": "swing-1a2b3c4d",
            "userType": "USER",
            "duration": 2.0,
            "poseData": [],
            "poseData3D": [],
            "frames": 60,
            "fps": 30.0,
            "impact_frame": 31,
            "score": 82,
            "feedback": "Solid contact",
            "rhythmTrack": [
                { "id": "n1", "timestamp": 0.5, "intensity": 0.6, "type": "BASS", "label": "Hips" }
            ],
            "velocityData": []
        })
    }

    #[test]
    fn test_config_defaults() {
        let config = MlClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_analyze_swing_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(body_partial_json(json!({ "swing_id": "swing-1a2b3c4d", "user_type": "USER" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = AnalyzeSwingRequest::new("/uploads/swing-1a2b3c4d.mp4", "swing-1a2b3c4d", JobKind::User);
        let analysis = client.analyze_swing(&request).await.unwrap();

        assert_eq!(analysis.id, "swing-1a2b3c4d");
        assert_eq!(analysis.score, 82);
        assert_eq!(analysis.rhythm_track.len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_swing_rejects_invalid_payload() {
        let server = MockServer::start().await;
        let mut body = analysis_body();
        body["score"] = json!(140);
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = AnalyzeSwingRequest::new("/v.mp4", "swing-1a2b3c4d", JobKind::User);
        let err = client.analyze_swing(&request).await.unwrap_err();

        assert!(matches!(err, MlError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(422).set_body_string("unreadable video"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = AnalyzeSwingRequest::new("/v.mp4", "swing-1", JobKind::User);
        let err = client.analyze_swing(&request).await.unwrap_err();

        assert!(matches!(err, MlError::RequestFailed(_)));
        assert!(err.to_string().contains("unreadable video"));
    }

    #[tokio::test]
    async fn test_unavailable_service_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = AnalyzeSwingRequest::new("/v.mp4", "swing-1", JobKind::Pro);
        let err = client.analyze_swing(&request).await.unwrap_err();

        assert!(matches!(err, MlError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "healthy" })))
            .mount(&server)
            .await;

        assert!(client_for(&server).health_check().await.unwrap());
    }
}
