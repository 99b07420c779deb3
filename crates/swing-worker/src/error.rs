//! Worker error types.

use std::time::Duration;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Job timed out after {0:?}")]
    Timeout(Duration),

    #[error("Processor panicked: {0}")]
    Panicked(String),

    #[error("A processor is already bound to this executor")]
    ProcessorAlreadyBound,

    #[error("Queue error: {0}")]
    Queue(#[from] swing_queue::QueueError),

    #[error("Inference error: {0}")]
    Ml(#[from] swing_ml_client::MlError),
}

impl WorkerError {
    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
