//! Analysis job record and lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::SwingAnalysis;

/// Progress reported as soon as a job is dispatched to a worker.
pub const DISPATCH_PROGRESS: u8 = 10;

/// Highest progress a running job may report; 100 is reserved for completion.
pub const MAX_RUNNING_PROGRESS: u8 = 99;

const MSG_QUEUED: &str = "Job queued";
const MSG_PROCESSING: &str = "Processing video...";
const MSG_COMPLETED: &str = "Analysis complete";
const MSG_FAILED: &str = "Analysis failed";

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting in the admission queue
    #[default]
    Pending,
    /// Dispatched to a worker
    Processing,
    /// Finished with a result
    Completed,
    /// Finished with an error
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether `next` is a legal successor of this status.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who the submitted swing belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobKind {
    /// Swing uploaded by an end user
    #[default]
    User,
    /// Professional reference swing
    Pro,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::User => "USER",
            JobKind::Pro => "PRO",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid transition for job {job_id}: {from} -> {to}")]
pub struct JobTransitionError {
    pub job_id: JobId,
    pub from: JobStatus,
    pub to: JobStatus,
}

/// A single analysis job.
///
/// Identity fields are fixed at creation. Lifecycle fields only change
/// through the transition methods below, which keep `result` and `error`
/// consistent with `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub job_id: JobId,

    /// Reference to the uploaded video (storage path)
    pub input_ref: String,

    /// Caller-supplied correlation label (swing ID)
    pub subject_id: String,

    /// User or pro swing
    pub kind: JobKind,

    /// Lifecycle status
    pub status: JobStatus,

    /// Progress (0-100)
    pub progress: u8,

    /// Human-readable status message
    pub message: String,

    /// Analysis result, present only when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SwingAnalysis>,

    /// Error description, present only when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last transition timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new pending job.
    pub fn new(input_ref: impl Into<String>, subject_id: impl Into<String>, kind: JobKind) -> Self {
        let now = Utc::now();

        Self {
            job_id: JobId::new(),
            input_ref: input_ref.into(),
            subject_id: subject_id.into(),
            kind,
            status: JobStatus::Pending,
            progress: 0,
            message: MSG_QUEUED.to_string(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn check(&self, to: JobStatus) -> Result<(), JobTransitionError> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(JobTransitionError {
                job_id: self.job_id.clone(),
                from: self.status,
                to,
            })
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Dispatch the job to a worker.
    pub fn start(&mut self) -> Result<(), JobTransitionError> {
        self.check(JobStatus::Processing)?;
        self.status = JobStatus::Processing;
        self.progress = self.progress.max(DISPATCH_PROGRESS);
        self.message = MSG_PROCESSING.to_string();
        self.touch();
        Ok(())
    }

    /// Record intermediate progress of a running job.
    ///
    /// Progress never moves backwards and stays below 100 until completion.
    /// Returns whether anything changed.
    pub fn advance(
        &mut self,
        progress: u8,
        message: Option<String>,
    ) -> Result<bool, JobTransitionError> {
        if self.status != JobStatus::Processing {
            return Err(JobTransitionError {
                job_id: self.job_id.clone(),
                from: self.status,
                to: JobStatus::Processing,
            });
        }

        let progress = progress.min(MAX_RUNNING_PROGRESS);
        let mut changed = false;

        if progress > self.progress {
            self.progress = progress;
            changed = true;
        }
        if let Some(message) = message.filter(|m| *m != self.message) {
            self.message = message;
            changed = true;
        }
        if changed {
            self.touch();
        }
        Ok(changed)
    }

    /// Mark job as completed with its analysis.
    pub fn complete(&mut self, result: SwingAnalysis) -> Result<(), JobTransitionError> {
        self.check(JobStatus::Completed)?;
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.message = MSG_COMPLETED.to_string();
        self.result = Some(result);
        self.touch();
        Ok(())
    }

    /// Mark job as failed.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), JobTransitionError> {
        self.check(JobStatus::Failed)?;
        let error = error.into();
        self.status = JobStatus::Failed;
        self.progress = 0;
        self.message = MSG_FAILED.to_string();
        self.error = Some(if error.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            error
        });
        self.touch();
        Ok(())
    }
}

/// Aggregate counts over all known jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    /// Jobs admitted but not yet picked up by the scheduler
    #[serde(rename = "queue_size")]
    pub queue_depth: usize,
}

impl JobStats {
    /// Count one job snapshot into its status bucket.
    pub fn record(&mut self, status: JobStatus) {
        self.total += 1;
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Processing => self.processing += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }
}
