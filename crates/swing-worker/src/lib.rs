//! Swing analysis worker pool.
//!
//! This crate provides:
//! - The `JobProcessor` interface and its inference-service implementation
//! - A job executor that drains the admission queue under a concurrency bound
//! - Per-job failure isolation (errors, panics, timeouts)
//! - Structured job logging

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod processor;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use processor::{InferenceProcessor, JobContext, JobProcessor};
