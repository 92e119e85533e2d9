//! Background workers
//!
//! `WorkerPool` drains the durable queue into the orchestration engine with
//! bounded concurrency. `MaintenanceTask` periodically reclaims expired
//! leases and prunes the rate window, the site cache and old dedup records.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use siteline::{IncomingEvent, Job, JobQueue, JobStatus, PROCESS_MESSAGE_JOB};

use crate::adapters::MemoryContextCache;
use crate::application::{Deduplicator, Orchestrator, RateLimiter};

/// Worker pool configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Turns processed concurrently
    pub max_jobs: usize,
    /// Sleep between polls when the queue is empty
    pub idle_poll: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_jobs: 10,
            idle_poll: Duration::from_millis(500),
        }
    }
}

/// Runs one claimed job to a terminal or retry state
#[derive(Clone)]
pub struct JobRunner {
    queue: Arc<dyn JobQueue>,
    orchestrator: Arc<Orchestrator>,
}

impl JobRunner {
    pub fn new(queue: Arc<dyn JobQueue>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            queue,
            orchestrator,
        }
    }

    /// Returns the job's status after this attempt
    pub async fn run(&self, job: Job) -> JobStatus {
        let event: IncomingEvent = match serde_json::from_value(job.payload.clone()) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(job_id = %job.id, "Undecodable job payload: {}", e);
                if let Err(e) = self
                    .queue
                    .dead_letter(job.id, &format!("invalid payload: {e}"))
                    .await
                {
                    tracing::error!(job_id = %job.id, "Failed to dead-letter job: {}", e);
                }
                return JobStatus::Dead;
            }
        };

        match self.orchestrator.process(&event).await {
            Ok(outcome) => {
                tracing::debug!(job_id = %job.id, event_id = %event.event_id, ?outcome, "Job completed");
                if let Err(e) = self.queue.complete(job.id).await {
                    tracing::error!(job_id = %job.id, "Failed to mark job completed: {}", e);
                }
                JobStatus::Completed
            }
            Err(e) if e.is_transient() => match self.queue.fail(job.id, &e.to_string()).await {
                Ok(status) => {
                    tracing::warn!(
                        job_id = %job.id,
                        event_id = %event.event_id,
                        attempt = job.attempts,
                        %status,
                        "Turn failed: {}",
                        e
                    );
                    status
                }
                Err(queue_err) => {
                    tracing::error!(job_id = %job.id, "Failed to record job failure: {}", queue_err);
                    JobStatus::Running
                }
            },
            Err(e) => {
                tracing::warn!(job_id = %job.id, event_id = %event.event_id, "Turn failed permanently: {}", e);
                if let Err(queue_err) = self.queue.dead_letter(job.id, &e.to_string()).await {
                    tracing::error!(job_id = %job.id, "Failed to dead-letter job: {}", queue_err);
                }
                JobStatus::Dead
            }
        }
    }
}

/// Handle to a started background task.
///
/// Dropping the handle detaches the task; the server keeps its handles and
/// stops them once the HTTP listener has shut down.
pub struct BackgroundHandle {
    shutdown: CancellationToken,
    join: JoinHandle<()>,
}

impl BackgroundHandle {
    /// Spawn `task` with a token that is cancelled by `stop`
    pub fn spawn<F, Fut>(task: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = CancellationToken::new();
        let join = tokio::spawn(task(shutdown.clone()));
        Self { shutdown, join }
    }

    /// Signal shutdown and wait for in-flight work to finish
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.join.await {
            tracing::error!("Background task panicked: {}", e);
        }
    }
}

pub struct WorkerPool {
    runner: JobRunner,
    config: WorkerConfig,
}

impl WorkerPool {
    pub fn new(runner: JobRunner, config: WorkerConfig) -> Self {
        Self { runner, config }
    }

    /// Start polling (runs in background)
    pub fn start(self) -> BackgroundHandle {
        BackgroundHandle::spawn(|token| self.run(token))
    }

    async fn run(self, shutdown: CancellationToken) {
        let max_jobs = self.config.max_jobs.max(1);
        tracing::info!("👷 Worker pool started (max {} concurrent jobs)", max_jobs);

        let permits = Arc::new(Semaphore::new(max_jobs));
        let mut in_flight = JoinSet::new();

        loop {
            let permit = tokio::select! {
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = shutdown.cancelled() => break,
            };

            while in_flight.try_join_next().is_some() {}

            match self.runner.queue.dequeue(PROCESS_MESSAGE_JOB).await {
                Ok(Some(job)) => {
                    let runner = self.runner.clone();
                    in_flight.spawn(async move {
                        runner.run(job).await;
                        drop(permit);
                    });
                    continue;
                }
                Ok(None) => drop(permit),
                Err(e) => {
                    drop(permit);
                    tracing::warn!("Queue poll failed: {}", e);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.idle_poll) => {}
                _ = shutdown.cancelled() => break,
            }
        }

        tracing::info!("👷 Worker pool stopping, waiting for {} jobs", in_flight.len());
        while in_flight.join_next().await.is_some() {}
        tracing::info!("👷 Worker pool stopped");
    }
}

/// Counts from one maintenance pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub requeued_jobs: u64,
    pub rate_entries_purged: u64,
    pub cache_entries_purged: usize,
    pub dedup_records_pruned: u64,
}

pub struct MaintenanceTask {
    queue: Arc<dyn JobQueue>,
    rate_limiter: Arc<RateLimiter>,
    cache: Arc<MemoryContextCache>,
    dedup: Arc<Deduplicator>,
    dedup_retention: Option<chrono::Duration>,
    every: Duration,
}

impl MaintenanceTask {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<MemoryContextCache>,
        dedup: Arc<Deduplicator>,
        dedup_retention: Option<chrono::Duration>,
        every: Duration,
    ) -> Self {
        Self {
            queue,
            rate_limiter,
            cache,
            dedup,
            dedup_retention,
            every,
        }
    }

    /// Start the maintenance loop (runs in background)
    pub fn start(self) -> BackgroundHandle {
        BackgroundHandle::spawn(|token| self.run(token))
    }

    async fn run(self, shutdown: CancellationToken) {
        tracing::info!("🧹 Maintenance started (interval: {:?})", self.every);
        let mut ticker = interval(self.every);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.run_once(Utc::now()).await;
                    if report != MaintenanceReport::default() {
                        tracing::info!(?report, "🧹 Maintenance pass");
                    }
                }
                _ = shutdown.cancelled() => break,
            }
        }
    }

    /// One pass; failures of individual steps are logged and skipped
    pub async fn run_once(&self, now: DateTime<Utc>) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match self.queue.requeue_expired().await {
            Ok(n) => report.requeued_jobs = n,
            Err(e) => tracing::warn!("Requeue of expired jobs failed: {}", e),
        }

        match self.rate_limiter.purge_expired(now).await {
            Ok(n) => report.rate_entries_purged = n,
            Err(e) => tracing::warn!("Rate window purge failed: {}", e),
        }

        report.cache_entries_purged = self.cache.purge_expired();

        if let Some(retention) = self.dedup_retention {
            match self.dedup.prune_before(now - retention).await {
                Ok(n) => report.dedup_records_pruned = n,
                Err(e) => tracing::warn!("Dedup prune failed: {}", e),
            }
        }

        report
    }
}
