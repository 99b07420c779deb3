//! Job queue facade shared by the API and the worker pool.

use std::time::Duration;

use swing_models::{Job, JobId, JobKind, JobStats, SwingAnalysis};
use tracing::{debug, error, info};

use crate::admission::AdmissionQueue;
use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};
use crate::metrics;
use crate::store::JobStore;

/// Job queue: the record store plus the admission queue feeding the
/// scheduler.
pub struct JobQueue {
    store: JobStore,
    admission: AdmissionQueue,
    config: QueueConfig,
}

impl JobQueue {
    /// Create a new job queue.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            store: JobStore::new(),
            admission: AdmissionQueue::new(),
            config,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(QueueConfig::from_env())
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Submit a new job. Returns the pending record without waiting for
    /// any processing.
    pub async fn submit(
        &self,
        input_ref: impl Into<String>,
        subject_id: impl Into<String>,
        kind: JobKind,
    ) -> QueueResult<Job> {
        if self.admission.is_closed() {
            return Err(QueueError::Closed);
        }

        let job = Job::new(input_ref, subject_id, kind);
        let job_id = job.job_id.clone();

        if let Err(e) = self.store.put(job.clone()).await {
            error!(job_id = %job_id, "Failed to store job: {}", e);
            return Err(e);
        }
        if let Err(e) = self.admission.enqueue(job.clone()) {
            self.store.discard(&job_id).await;
            return Err(e);
        }

        metrics::record_job_enqueued(kind);
        metrics::set_queue_length(self.admission.depth());
        info!(
            job_id = %job_id,
            subject_id = %job.subject_id,
            kind = %kind,
            "Job submitted"
        );

        Ok(job)
    }

    /// Get a job snapshot.
    pub async fn get(&self, job_id: &JobId) -> QueueResult<Job> {
        self.store.get(job_id).await
    }

    /// Long-poll a job until it finishes or the (clamped) timeout elapses.
    pub async fn wait_for(&self, job_id: &JobId, timeout: Option<Duration>) -> QueueResult<Job> {
        let timeout = self.config.wait_timeout(timeout);
        self.store.wait_for(job_id, timeout).await
    }

    /// Aggregate statistics.
    pub async fn stats(&self) -> JobStats {
        let mut stats = self.store.stats().await;
        stats.queue_depth = self.admission.depth();
        stats
    }

    /// Number of jobs waiting for a worker slot.
    pub fn queue_depth(&self) -> usize {
        self.admission.depth()
    }

    /// Next job for the scheduler, in submission order. `None` once closed.
    pub async fn next_job(&self) -> Option<Job> {
        let job = self.admission.dequeue().await;
        if job.is_some() {
            metrics::set_queue_length(self.admission.depth());
        }
        job
    }

    /// PENDING -> PROCESSING.
    pub async fn mark_processing(&self, job_id: &JobId) -> QueueResult<Job> {
        self.store
            .update(job_id, |job| job.start().map(|_| true))
            .await
    }

    /// Publish intermediate progress for a running job.
    pub async fn report_progress(
        &self,
        job_id: &JobId,
        progress: u8,
        message: Option<String>,
    ) -> QueueResult<()> {
        self.store
            .update(job_id, |job| job.advance(progress, message))
            .await?;
        debug!(job_id = %job_id, progress, "Progress updated");
        Ok(())
    }

    /// PROCESSING -> COMPLETED.
    pub async fn complete(&self, job_id: &JobId, result: SwingAnalysis) -> QueueResult<Job> {
        self.store
            .update(job_id, |job| job.complete(result).map(|_| true))
            .await
    }

    /// PROCESSING -> FAILED.
    pub async fn fail(&self, job_id: &JobId, error: impl Into<String>) -> QueueResult<Job> {
        let error = error.into();
        self.store
            .update(job_id, |job| job.fail(error).map(|_| true))
            .await
    }

    /// Stop admitting jobs and release the scheduler's pending dequeue.
    pub fn close(&self) {
        info!("Closing job queue");
        self.admission.close();
    }

    pub fn is_closed(&self) -> bool {
        self.admission.is_closed()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}
