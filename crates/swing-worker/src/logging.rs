//! Structured job logging.

use std::time::Duration;

use swing_models::{JobId, JobKind};
use tracing::{error, info, warn, Span};

/// Stamps every lifecycle event of one job with its ID, kind and the
/// operation being run.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    kind: JobKind,
    operation: &'static str,
}

impl JobLogger {
    pub fn new(job_id: &JobId, kind: JobKind, operation: &'static str) -> Self {
        Self {
            job_id: job_id.to_string(),
            kind,
            operation,
        }
    }

    pub fn log_start(&self, input_ref: &str) {
        info!(
            job_id = %self.job_id,
            kind = %self.kind,
            operation = self.operation,
            input_ref,
            "Job started"
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_failure(&self, elapsed: Duration, reason: &str) {
        error!(
            job_id = %self.job_id,
            kind = %self.kind,
            operation = self.operation,
            elapsed_ms = elapsed.as_millis() as u64,
            "Job failed: {}", reason
        );
    }

    pub fn log_completion(&self, elapsed: Duration) {
        info!(
            job_id = %self.job_id,
            kind = %self.kind,
            operation = self.operation,
            elapsed_ms = elapsed.as_millis() as u64,
            "Job completed"
        );
    }

    /// Span covering the job's execution.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            kind = %self.kind,
            operation = self.operation
        )
    }
}
