//! Job executor.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::FutureExt;
use swing_models::{Job, SwingAnalysis};
use swing_queue::{metrics, JobQueue};
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::processor::{JobContext, JobProcessor};

const OPERATION: &str = "swing_analysis";

/// Job executor that drains the admission queue with at most
/// `max_concurrent_jobs` jobs running at once.
pub struct JobExecutor {
    config: WorkerConfig,
    shared: Arc<Shared>,
    running: Mutex<Option<RunningLoop>>,
}

/// State shared between the executor handle, its loop and job tasks.
struct Shared {
    queue: Arc<JobQueue>,
    processor: OnceLock<Arc<dyn JobProcessor>>,
    slots: Arc<Semaphore>,
    job_timeout: Duration,
    in_flight: AtomicUsize,
}

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl JobExecutor {
    /// Create an executor with no processor bound yet.
    pub fn new(config: WorkerConfig, queue: Arc<JobQueue>) -> Self {
        let shared = Arc::new(Shared {
            queue,
            processor: OnceLock::new(),
            slots: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
            job_timeout: config.job_timeout,
            in_flight: AtomicUsize::new(0),
        });

        Self {
            config,
            shared,
            running: Mutex::new(None),
        }
    }

    /// Create an executor with its processor already bound.
    pub fn with_processor(
        config: WorkerConfig,
        queue: Arc<JobQueue>,
        processor: Arc<dyn JobProcessor>,
    ) -> Self {
        let executor = Self::new(config, queue);
        // Freshly created, so the cell is empty.
        let _ = executor.shared.processor.set(processor);
        executor
    }

    /// Bind the processor. Only one binding is allowed per executor.
    pub fn bind_processor(&self, processor: Arc<dyn JobProcessor>) -> WorkerResult<()> {
        self.shared
            .processor
            .set(processor)
            .map_err(|_| WorkerError::ProcessorAlreadyBound)
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.shared.queue
    }

    /// Number of jobs currently inside a processor.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Whether the scheduling loop is alive.
    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Start the scheduling loop. Calling it while already running is a no-op.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
        {
            debug!("Job executor already running");
            return;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(Arc::clone(&self.shared), shutdown_rx));
        *running = Some(RunningLoop { shutdown, handle });

        info!(
            max_concurrent_jobs = self.config.max_concurrent_jobs,
            job_timeout_secs = self.config.job_timeout.as_secs(),
            "Job executor started"
        );
    }

    /// Stop taking new jobs, then wait up to `shutdown_timeout` for the
    /// jobs already running. Queued jobs stay queued for a later `start`.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            debug!("Job executor not running");
            return;
        };

        info!("Stopping job executor");
        running.shutdown.send_replace(true);
        if let Err(e) = running.handle.await {
            error!("Job executor loop terminated abnormally: {}", e);
        }

        let all_slots = u32::try_from(self.config.max_concurrent_jobs).unwrap_or(u32::MAX);
        match tokio::time::timeout(
            self.config.shutdown_timeout,
            self.shared.slots.acquire_many(all_slots),
        )
        .await
        {
            Ok(Ok(_slots)) => debug!("All in-flight jobs finished"),
            Ok(Err(e)) => warn!("Worker slots unavailable during shutdown: {}", e),
            Err(_) => warn!(
                in_flight = self.in_flight(),
                "Shutdown timeout elapsed with jobs still running"
            ),
        }

        info!("Job executor stopped");
    }
}

/// Scheduling loop: take a free slot, then the next job, then hand both to
/// a new task. A job is only ever dequeued once it has a slot to run in.
async fn run_loop(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    loop {
        let permit = tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break,
            permit = Arc::clone(&shared.slots).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let job = tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break,
            job = shared.queue.next_job() => match job {
                Some(job) => job,
                None => {
                    info!("Job queue closed, scheduling loop exiting");
                    break;
                }
            },
        };

        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            let _permit = permit;
            shared.execute(job).await;
        });
    }

    debug!("Scheduling loop stopped");
}

impl Shared {
    /// Run one job to a terminal state. Never returns an error: every
    /// failure ends up on the job record.
    async fn execute(&self, job: Job) {
        let job_id = job.job_id.clone();
        let kind = job.kind;
        let logger = JobLogger::new(&job_id, kind, OPERATION);

        let job = match self.queue.mark_processing(&job_id).await {
            Ok(job) => job,
            Err(e) => {
                logger.log_warning(&format!("skipping job that cannot start: {}", e));
                return;
            }
        };

        let span = logger.create_span();

        async move {
            logger.log_start(&job.input_ref);
            metrics::set_jobs_in_flight(self.in_flight.fetch_add(1, Ordering::SeqCst) + 1);

            let started = Instant::now();
            let outcome = self
                .run_processor(JobContext::new(job, Arc::clone(&self.queue)))
                .await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(analysis) => match self.queue.complete(&job_id, analysis).await {
                    Ok(_) => {
                        logger.log_completion(elapsed);
                        metrics::record_job_completed(kind, elapsed.as_secs_f64());
                    }
                    Err(e) => error!(job_id = %job_id, "Failed to record completion: {}", e),
                },
                Err(e) => {
                    let reason = e.to_string();
                    logger.log_failure(elapsed, &reason);
                    if let Err(e) = self.queue.fail(&job_id, reason).await {
                        error!(job_id = %job_id, "Failed to record failure: {}", e);
                    }
                    metrics::record_job_failed(kind, elapsed.as_secs_f64());
                }
            }

            metrics::set_jobs_in_flight(self.in_flight.fetch_sub(1, Ordering::SeqCst) - 1);
        }
        .instrument(span)
        .await
    }

    /// Invoke the bound processor under the job timeout, turning panics
    /// into errors.
    async fn run_processor(&self, ctx: JobContext) -> WorkerResult<SwingAnalysis> {
        let Some(processor) = self.processor.get().cloned() else {
            return Err(WorkerError::config_error("No processor configured"));
        };

        let guarded = AssertUnwindSafe(processor.process(&ctx)).catch_unwind();
        match tokio::time::timeout(self.job_timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(payload)) => Err(WorkerError::Panicked(panic_message(payload.as_ref()))),
            Err(_) => Err(WorkerError::Timeout(self.job_timeout)),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
