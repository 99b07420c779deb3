//! FIFO admission queue.

use std::sync::atomic::{AtomicUsize, Ordering};

use swing_models::Job;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::debug;

use crate::error::{QueueError, QueueResult};

/// Unbounded multi-producer, single-consumer queue of jobs awaiting a worker.
///
/// `enqueue` never waits. `dequeue` is cancel-safe: dropping a pending
/// `dequeue` future never loses a job.
pub struct AdmissionQueue {
    tx: mpsc::UnboundedSender<Job>,
    rx: Mutex<mpsc::UnboundedReceiver<Job>>,
    depth: AtomicUsize,
    closed: watch::Sender<bool>,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);

        Self {
            tx,
            rx: Mutex::new(rx),
            depth: AtomicUsize::new(0),
            closed,
        }
    }

    /// Append a job to the tail of the queue.
    pub fn enqueue(&self, job: Job) -> QueueResult<()> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }

        // Count before sending so a fast consumer never drives depth below zero.
        self.depth.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::Closed);
        }
        Ok(())
    }

    /// Wait for the next job in FIFO order.
    ///
    /// Returns `None` once the queue has been closed.
    pub async fn dequeue(&self) -> Option<Job> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return None;
        }

        let mut rx = self.rx.lock().await;
        tokio::select! {
            biased;
            _ = closed.wait_for(|closed| *closed) => {
                debug!("Admission queue closed, dequeue returning none");
                None
            }
            job = rx.recv() => {
                if job.is_some() {
                    self.depth.fetch_sub(1, Ordering::SeqCst);
                }
                job
            }
        }
    }

    /// Stop accepting jobs and release any waiting consumer.
    ///
    /// Jobs still queued are left in place and never dispatched.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Number of admitted jobs not yet taken by the consumer.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

impl Default for AdmissionQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use swing_models::JobKind;

    use super::*;

    fn job(subject: &str) -> Job {
        Job::new(format!("/tmp/{subject}.mp4"), subject, JobKind::User)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = AdmissionQueue::new();
        for subject in ["a", "b", "c"] {
            queue.enqueue(job(subject)).unwrap();
        }
        assert_eq!(queue.depth(), 3);

        let order: Vec<String> = vec![
            queue.dequeue().await.unwrap().subject_id,
            queue.dequeue().await.unwrap().subject_id,
            queue.dequeue().await.unwrap().subject_id,
        ];
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn test_dequeue_waits_for_job() {
        let queue = Arc::new(AdmissionQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!consumer.is_finished());

        queue.enqueue(job("late")).unwrap();
        let received = consumer.await.unwrap().unwrap();
        assert_eq!(received.subject_id, "late");
    }

    #[tokio::test]
    async fn test_close_releases_consumer_and_rejects_enqueue() {
        let queue = Arc::new(AdmissionQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await })
        };
        tokio::task::yield_now().await;

        queue.close();
        assert!(consumer.await.unwrap().is_none());
        assert!(matches!(queue.enqueue(job("x")), Err(QueueError::Closed)));
        assert!(queue.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_dequeue_keeps_job() {
        let queue = AdmissionQueue::new();

        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), queue.dequeue()).await;
        assert!(timed_out.is_err());

        queue.enqueue(job("kept")).unwrap();
        assert_eq!(queue.dequeue().await.unwrap().subject_id, "kept");
    }
}
