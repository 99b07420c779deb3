//! In-process analysis job queue.
//!
//! This crate provides:
//! - A concurrent job store with per-job change notification
//! - An unbounded FIFO admission queue
//! - Long-poll waits and aggregate statistics
//! - The `JobQueue` facade shared by the API and the worker pool

pub mod admission;
pub mod config;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod store;

pub use admission::AdmissionQueue;
pub use config::QueueConfig;
pub use error::{QueueError, QueueResult};
pub use queue::JobQueue;
pub use store::JobStore;
