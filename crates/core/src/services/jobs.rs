//! Job processing service for background tasks.
//!
//! This module provides a simple in-memory job queue for periodic
//! maintenance work, currently the ban sweep.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use quad_common::get_metrics;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::services::ban::BanPropagator;

/// Maximum number of concurrent job workers.
const MAX_WORKERS: usize = 4;

/// Channel buffer size for jobs.
const JOB_BUFFER_SIZE: usize = 1000;

/// Job types that can be processed.
#[derive(Debug, Clone)]
pub enum Job {
    /// Lift expired temporary bans and re-hide content from banned
    /// accounts.
    BanSweep,
}

/// Job sender for enqueueing jobs.
#[derive(Clone)]
pub struct JobSender {
    sender: mpsc::Sender<Job>,
}

impl JobSender {
    /// Enqueue a job for processing.
    pub async fn enqueue(&self, job: Job) -> Result<(), &'static str> {
        self.sender
            .send(job)
            .await
            .map_err(|_| "Job queue is full")?;
        get_metrics().jobs_enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Enqueue a ban sweep job.
    pub async fn ban_sweep(&self) -> Result<(), &'static str> {
        self.enqueue(Job::BanSweep).await
    }
}

/// Job worker context containing services needed for job processing.
#[derive(Clone)]
pub struct JobWorkerContext {
    pub ban_propagator: Option<BanPropagator>,
}

/// Job processing service.
pub struct JobService {
    sender: mpsc::Sender<Job>,
    receiver: Option<mpsc::Receiver<Job>>,
}

impl JobService {
    /// Create a new job service.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(JOB_BUFFER_SIZE);
        Self {
            sender,
            receiver: Some(receiver),
        }
    }

    /// Get a job sender for enqueueing jobs.
    #[must_use]
    pub fn sender(&self) -> JobSender {
        JobSender {
            sender: self.sender.clone(),
        }
    }

    /// Start the job processor with the given context.
    /// This consumes the receiver and spawns worker tasks.
    pub fn start(mut self, context: JobWorkerContext) {
        let receiver = self.receiver.take().expect("Job service already started");
        let context = Arc::new(context);

        tokio::spawn(async move {
            info!("Job worker starting with {} workers", MAX_WORKERS);
            run_job_processor(receiver, context).await;
            info!("Job worker stopped");
        });
    }
}

impl Default for JobService {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the job processor.
async fn run_job_processor(mut receiver: mpsc::Receiver<Job>, context: Arc<JobWorkerContext>) {
    // Use a semaphore to limit concurrent workers
    let semaphore = Arc::new(tokio::sync::Semaphore::new(MAX_WORKERS));

    while let Some(job) = receiver.recv().await {
        let permit = semaphore.clone().acquire_owned().await;
        let ctx = context.clone();

        tokio::spawn(async move {
            let _permit = permit;
            process_job(job, &ctx).await;
        });
    }
}

/// Process a single job.
async fn process_job(job: Job, context: &JobWorkerContext) {
    match job {
        Job::BanSweep => {
            process_ban_sweep(context).await;
        }
    }
}

/// Process a ban sweep job.
async fn process_ban_sweep(context: &JobWorkerContext) {
    let Some(ref propagator) = context.ban_propagator else {
        debug!("Ban propagator not available, skipping sweep");
        return;
    };

    match propagator.sweep(chrono::Utc::now().into()).await {
        Ok(outcome) => {
            get_metrics().jobs_completed.fetch_add(1, Ordering::Relaxed);
            if outcome.bans_lifted > 0 || outcome.posts_rehidden > 0 {
                info!(
                    bans_lifted = outcome.bans_lifted,
                    posts_rehidden = outcome.posts_rehidden,
                    "Ban sweep finished"
                );
            } else {
                debug!("Ban sweep finished with nothing to do");
            }
        }
        Err(e) => {
            get_metrics().jobs_failed.fetch_add(1, Ordering::Relaxed);
            error!(error = %e, "Ban sweep failed");
        }
    }
}
