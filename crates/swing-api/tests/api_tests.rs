//! API integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use swing_api::{create_router, ApiConfig, AppState};
use swing_ml_client::{MlClient, MlClientConfig};
use swing_models::{JobKind, SwingAnalysis};
use swing_queue::JobQueue;
use swing_worker::{JobContext, JobExecutor, JobProcessor, WorkerConfig, WorkerResult};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "swingtestboundary";

/// Returns a fixed analysis for the job's subject.
struct InstantProcessor;

#[async_trait]
impl JobProcessor for InstantProcessor {
    async fn process(&self, ctx: &JobContext) -> WorkerResult<SwingAnalysis> {
        Ok(SwingAnalysis {
            id: ctx.subject_id().to_string(),
            user_type: ctx.kind(),
            video_url: None,
            duration: 1.2,
            pose_data: Vec::new(),
            pose_data_3d: Vec::new(),
            frames: 36,
            fps: 30.0,
            impact_frame: 18,
            score: 88,
            feedback: "Great extension through contact".to_string(),
            rhythm_track: Vec::new(),
            velocity_data: Vec::new(),
        })
    }
}

struct TestApp {
    router: Router,
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor>,
    uploads: TempDir,
}

async fn test_app(ml: Option<MlClient>, max_body_size: usize) -> TestApp {
    let uploads = TempDir::new().unwrap();
    let config = ApiConfig {
        upload_dir: uploads.path().to_path_buf(),
        max_body_size,
        ..ApiConfig::default()
    };

    let queue = Arc::new(JobQueue::default());
    let executor = Arc::new(JobExecutor::with_processor(
        WorkerConfig::default(),
        Arc::clone(&queue),
        Arc::new(InstantProcessor),
    ));
    let state = AppState::new(
        config,
        Arc::clone(&queue),
        Arc::clone(&executor),
        ml.map(Arc::new),
    );

    TestApp {
        router: create_router(state, None),
        queue,
        executor,
        uploads,
    }
}

fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(None, 1024 * 1024).await;

    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["queue"]["total"], 0);
    assert_eq!(body["queue"]["queue_size"], 0);
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let app = test_app(None, 1024 * 1024).await;

    let response = app.router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "running");
    assert_eq!(body["endpoints"]["submit"], "POST /api/v1/analyze");
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let app = test_app(None, 1024 * 1024).await;

    let response = app
        .router
        .clone()
        .oneshot(get("/api/v1/jobs/nonexistent"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["detail"], "Job not found: nonexistent");

    let response = app
        .router
        .oneshot(get("/api/v1/jobs/nonexistent/wait?timeout=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_runs_job_to_completion() {
    let app = test_app(None, 1024 * 1024).await;
    app.executor.start().await;

    let video = b"\x00\x00\x00\x18ftypmp42 fake video bytes";
    let response = app
        .router
        .clone()
        .oneshot(multipart_request("video", "forehand.MP4", video))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = json_body(response).await;
    assert_eq!(body["status"], "pending");
    let job_id = body["job_id"].as_str().unwrap().to_string();
    assert_eq!(
        body["message"],
        format!("Video uploaded for analysis (Job ID: {})", job_id)
    );

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/jobs/{}/wait?timeout=5", job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["progress"], 100);
    assert_eq!(body["message"], "Analysis complete");
    assert_eq!(body["result"]["score"], 88);
    assert!(body["result"]["id"].as_str().unwrap().starts_with("swing-"));
    assert!(body["error"].is_null());

    let saved: Vec<_> = std::fs::read_dir(app.uploads.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].extension().unwrap(), "mp4");
    assert_eq!(std::fs::read(&saved[0]).unwrap(), video);

    let job = app
        .queue
        .get(&swing_models::JobId::from_string(job_id))
        .await
        .unwrap();
    assert_eq!(job.kind, JobKind::User);
    assert!(saved[0].ends_with(format!("{}.mp4", job.subject_id)));

    app.executor.stop().await;
}

#[tokio::test]
async fn test_upload_rejects_unsupported_type() {
    let app = test_app(None, 1024 * 1024).await;

    let response = app
        .router
        .oneshot(multipart_request("video", "notes.txt", b"hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("Invalid file type"));
    assert_eq!(app.queue.stats().await.total, 0);
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_requires_video_field() {
    let app = test_app(None, 1024 * 1024).await;

    let response = app
        .router
        .oneshot(multipart_request("attachment", "swing.mp4", b"data"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.queue.stats().await.total, 0);
}

#[tokio::test]
async fn test_upload_over_body_limit() {
    let app = test_app(None, 1024).await;

    let response = app
        .router
        .oneshot(multipart_request("video", "serve.mov", &[7u8; 4096]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.queue.stats().await.total, 0);
}

#[tokio::test]
async fn test_wait_timeout_returns_current_snapshot() {
    let app = test_app(None, 1024 * 1024).await;
    let job = app
        .queue
        .submit("/uploads/swing-1.mp4", "swing-1", JobKind::User)
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(get(&format!("/api/v1/jobs/{}/wait?timeout=0.1", job.job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["message"], "Job queued");
    assert!(body["result"].is_null());
}

#[tokio::test]
async fn test_wait_with_huge_timeout_is_clamped() {
    let app = test_app(None, 1024 * 1024).await;
    app.executor.start().await;
    let job = app
        .queue
        .submit("/uploads/swing-2.mp4", "swing-2", JobKind::User)
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(get(&format!("/api/v1/jobs/{}/wait?timeout=1e300", job.job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "completed");

    app.executor.stop().await;
}

#[tokio::test]
async fn test_wait_rejects_negative_timeout() {
    let app = test_app(None, 1024 * 1024).await;
    let job = app.queue.submit("in", "swing-1", JobKind::User).await.unwrap();

    let response = app
        .router
        .oneshot(get(&format!("/api/v1/jobs/{}/wait?timeout=-3", job.job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let app = test_app(None, 1024 * 1024).await;
    for i in 0..3 {
        app.queue
            .submit(format!("in-{i}"), format!("swing-{i}"), JobKind::User)
            .await
            .unwrap();
    }

    let response = app.router.oneshot(get("/api/v1/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["pending"], 3);
    assert_eq!(body["processing"], 0);
    assert_eq!(body["completed"], 0);
    assert_eq!(body["failed"], 0);
    assert_eq!(body["queue_size"], 3);
}

#[tokio::test]
async fn test_ready_requires_executor_and_inference() {
    let app = test_app(None, 1024 * 1024).await;
    let response = app.router.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["executor"]["status"], "error");
    assert_eq!(body["checks"]["inference"]["status"], "error");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })))
        .mount(&server)
        .await;
    let ml = MlClient::new(MlClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        max_retries: 0,
    })
    .unwrap();

    let app = test_app(Some(ml), 1024 * 1024).await;
    app.executor.start().await;

    let response = app.router.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ready");

    app.executor.stop().await;
}

#[tokio::test]
async fn test_response_headers() {
    let app = test_app(None, 1024 * 1024).await;

    let response = app
        .router
        .clone()
        .oneshot(get("/health"))
        .await
        .unwrap();
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_metrics_route_disabled_without_handle() {
    let app = test_app(None, 1024 * 1024).await;

    let response = app.router.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
