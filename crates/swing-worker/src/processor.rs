//! Job processor interface.
//!
//! The executor knows nothing about pose estimation: it hands each job to a
//! `JobProcessor` and records whatever comes back. `InferenceProcessor` is
//! the production implementation backed by the inference service.

use std::sync::Arc;

use async_trait::async_trait;
use swing_ml_client::{AnalyzeSwingRequest, MlClient, DEFAULT_MODEL_CODE};
use swing_models::{Job, JobId, JobKind, SwingAnalysis};
use swing_queue::JobQueue;
use tracing::debug;

use crate::error::WorkerResult;

/// Produces an analysis for one job.
///
/// Any error (or panic) is recorded on the job as a failure; it never
/// affects other jobs or the executor.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    async fn process(&self, ctx: &JobContext) -> WorkerResult<SwingAnalysis>;
}

/// What a processor sees of the job it is running.
pub struct JobContext {
    job: Job,
    queue: Arc<JobQueue>,
}

impl JobContext {
    pub(crate) fn new(job: Job, queue: Arc<JobQueue>) -> Self {
        Self { job, queue }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job.job_id
    }

    pub fn input_ref(&self) -> &str {
        &self.job.input_ref
    }

    pub fn subject_id(&self) -> &str {
        &self.job.subject_id
    }

    pub fn kind(&self) -> JobKind {
        self.job.kind
    }

    /// Publish intermediate progress. Values only ever move forward and
    /// stay below 100; late or out-of-order reports are dropped.
    pub async fn report_progress(&self, progress: u8, message: Option<&str>) {
        let message = message.map(str::to_string);
        if let Err(e) = self
            .queue
            .report_progress(&self.job.job_id, progress, message)
            .await
        {
            debug!(job_id = %self.job.job_id, "Progress report dropped: {}", e);
        }
    }
}

/// Processor that delegates to the YOC44 inference service.
pub struct InferenceProcessor {
    client: MlClient,
    model_code: String,
}

impl InferenceProcessor {
    pub fn new(client: MlClient) -> Self {
        Self {
            client,
            model_code: DEFAULT_MODEL_CODE.to_string(),
        }
    }

    /// Select the inference model.
    pub fn with_model(mut self, model_code: impl Into<String>) -> Self {
        self.model_code = model_code.into();
        self
    }
}

#[async_trait]
impl JobProcessor for InferenceProcessor {
    async fn process(&self, ctx: &JobContext) -> WorkerResult<SwingAnalysis> {
        let request = AnalyzeSwingRequest::new(ctx.input_ref(), ctx.subject_id(), ctx.kind())
            .with_model(self.model_code.as_str());

        ctx.report_progress(20, Some("Running pose estimation")).await;
        let analysis = self.client.analyze_swing(&request).await?;

        Ok(analysis)
    }
}
