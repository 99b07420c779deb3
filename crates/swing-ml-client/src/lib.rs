//! Client for the YOC44 pose-inference service.
//!
//! The service takes an uploaded swing video and returns 3D skeleton data
//! plus rhythm and kinetic analysis. This crate only speaks its HTTP API;
//! the job queue decides when to call it.

pub mod client;
pub mod error;
pub mod types;

pub use client::{MlClient, MlClientConfig};
pub use error::{MlError, MlResult};
pub use types::{AnalyzeSwingRequest, HealthResponse, DEFAULT_MODEL_CODE};
