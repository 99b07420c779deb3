//! Concurrent job store.
//!
//! Each job lives in its own `watch` channel: writers replace the record
//! under that channel's lock and every receiver is woken on change. The
//! outer map lock is only held to find or insert a channel, never while
//! waiting on a job.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use swing_models::{Job, JobId, JobStats, JobTransitionError};
use tokio::sync::{watch, RwLock};
use tracing::debug;

use crate::error::{QueueError, QueueResult};

type JobCell = Arc<watch::Sender<Job>>;

/// Map from job ID to the job's current record.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, JobCell>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new job. Fails if the ID is already taken.
    pub async fn put(&self, job: Job) -> QueueResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.job_id) {
            return Err(QueueError::DuplicateJob(job.job_id));
        }

        let job_id = job.job_id.clone();
        let (cell, _) = watch::channel(job);
        jobs.insert(job_id, Arc::new(cell));
        Ok(())
    }

    /// Drop a job that was never admitted.
    pub(crate) async fn discard(&self, job_id: &JobId) {
        self.jobs.write().await.remove(job_id);
    }

    async fn cell(&self, job_id: &JobId) -> QueueResult<JobCell> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| QueueError::JobNotFound(job_id.clone()))
    }

    /// Current snapshot of a job.
    pub async fn get(&self, job_id: &JobId) -> QueueResult<Job> {
        let cell = self.cell(job_id).await?;
        let job = cell.borrow().clone();
        Ok(job)
    }

    /// Apply a transition to a job and return the resulting snapshot.
    ///
    /// The closure reports whether it changed anything; waiters are only
    /// woken when it did. A rejected transition leaves the job untouched.
    pub async fn update<F>(&self, job_id: &JobId, apply: F) -> QueueResult<Job>
    where
        F: FnOnce(&mut Job) -> Result<bool, JobTransitionError>,
    {
        let cell = self.cell(job_id).await?;

        let mut rejected = None;
        cell.send_if_modified(|job| match apply(job) {
            Ok(changed) => changed,
            Err(e) => {
                rejected = Some(e);
                false
            }
        });

        if let Some(e) = rejected {
            return Err(e.into());
        }
        let job = cell.borrow().clone();
        Ok(job)
    }

    /// Subscribe to changes of one job.
    pub async fn subscribe(&self, job_id: &JobId) -> QueueResult<watch::Receiver<Job>> {
        Ok(self.cell(job_id).await?.subscribe())
    }

    /// Wait until the job reaches a terminal status or `timeout` elapses,
    /// then return its current snapshot either way.
    pub async fn wait_for(&self, job_id: &JobId, timeout: Duration) -> QueueResult<Job> {
        let mut rx = self.subscribe(job_id).await?;

        let waited = tokio::time::timeout(timeout, async {
            // Jobs are never removed once admitted, so the sender outlives the wait.
            let _ = rx.wait_for(|job| job.is_terminal()).await;
        })
        .await;

        if waited.is_err() {
            debug!(job_id = %job_id, ?timeout, "Wait timed out before job finished");
        }

        let job = rx.borrow().clone();
        Ok(job)
    }

    /// Count jobs per status.
    ///
    /// Each job's status is read exactly once, so the buckets always sum to
    /// the total. `queue_depth` is left for the caller to fill in.
    pub async fn stats(&self) -> JobStats {
        let jobs = self.jobs.read().await;
        let mut stats = JobStats::default();
        for cell in jobs.values() {
            let status = cell.borrow().status;
            stats.record(status);
        }
        stats
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
