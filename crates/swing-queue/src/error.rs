//! Queue error types.

use swing_models::{JobId, JobTransitionError};
use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Duplicate job: {0}")]
    DuplicateJob(JobId),

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Queue is closed")]
    Closed,

    #[error(transparent)]
    InvalidTransition(#[from] JobTransitionError),
}
