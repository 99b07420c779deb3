//! Shared data models for the SwingSymphony backend.
//!
//! This crate provides Serde-serializable types for:
//! - Analysis jobs and their lifecycle
//! - Queue statistics
//! - Swing analysis results (2D/3D pose data, rhythm, kinetics)

pub mod analysis;
pub mod job;

// Re-export common types
pub use analysis::{
    KineticDataPoint, Keypoint2D, Keypoint3D, PoseFrame2D, PoseFrame3D, RhythmNode, RhythmType,
    SwingAnalysis,
};
pub use job::{Job, JobId, JobKind, JobStats, JobStatus, JobTransitionError};
