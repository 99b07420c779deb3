//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum jobs executing at once
    pub max_concurrent_jobs: usize,
    /// Per-job processing timeout
    pub job_timeout: Duration,
    /// How long `stop` waits for in-flight jobs
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            job_timeout: Duration::from_secs(3600), // 1 hour
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_concurrent_jobs = std::env::var("MAX_CONCURRENT_JOBS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_concurrent_jobs);
        let job_timeout = std::env::var("WORKER_JOB_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.job_timeout);
        let shutdown_timeout = std::env::var("WORKER_SHUTDOWN_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.shutdown_timeout);

        Self {
            shutdown_timeout,
            ..defaults
        }
        .with_max_concurrent_jobs(max_concurrent_jobs)
        .with_job_timeout(job_timeout)
    }

    /// Set the concurrency bound.
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self.normalized()
    }

    /// Set the per-job timeout.
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    // A zero-permit pool would never dispatch anything.
    fn normalized(mut self) -> Self {
        self.max_concurrent_jobs = self.max_concurrent_jobs.max(1);
        self
    }
}
