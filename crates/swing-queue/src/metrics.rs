//! Job lifecycle metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus exporter that renders them.

use metrics::{counter, gauge, histogram};
use swing_models::JobKind;

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_ENQUEUED_TOTAL: &str = "swing_jobs_enqueued_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "swing_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "swing_jobs_failed_total";
    pub const JOB_DURATION_SECONDS: &str = "swing_job_duration_seconds";
    pub const QUEUE_LENGTH: &str = "swing_queue_length";
    pub const JOBS_IN_FLIGHT: &str = "swing_jobs_in_flight";
}

/// Record job enqueued.
pub fn record_job_enqueued(kind: JobKind) {
    let labels = [("kind", kind.as_str())];
    counter!(names::JOBS_ENQUEUED_TOTAL, &labels).increment(1);
}

/// Record job completed.
pub fn record_job_completed(kind: JobKind, duration_secs: f64) {
    let labels = [("kind", kind.as_str())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record job failed.
pub fn record_job_failed(kind: JobKind, duration_secs: f64) {
    let labels = [("kind", kind.as_str())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Update queue length gauge.
pub fn set_queue_length(length: usize) {
    gauge!(names::QUEUE_LENGTH).set(length as f64);
}

/// Update in-flight jobs gauge.
pub fn set_jobs_in_flight(count: usize) {
    gauge!(names::JOBS_IN_FLIGHT).set(count as f64);
}
