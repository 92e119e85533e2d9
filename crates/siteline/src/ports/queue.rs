//! Durable Queue Port
//!
//! At-least-once delivery channel between intake and orchestration.
//! Retry count, backoff, and lease expiry belong to the queue, not to the
//! code that runs the job.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{errors::DomainError, Job, JobStatus};

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job; the returned id identifies it for the rest of its life
    async fn enqueue(&self, name: &str, payload: serde_json::Value) -> Result<Uuid, DomainError>;

    /// Claim the oldest due job with this name, if any
    async fn dequeue(&self, name: &str) -> Result<Option<Job>, DomainError>;

    async fn complete(&self, id: Uuid) -> Result<(), DomainError>;

    /// Record a failed attempt.
    ///
    /// Returns `Pending` when the job will be retried, `Dead` when its
    /// attempts are exhausted.
    async fn fail(&self, id: Uuid, error: &str) -> Result<JobStatus, DomainError>;

    /// Give up on a job immediately, regardless of remaining attempts
    async fn dead_letter(&self, id: Uuid, error: &str) -> Result<(), DomainError>;

    /// Return jobs whose lease expired to the pending state; returns how many
    async fn requeue_expired(&self) -> Result<u64, DomainError>;
}
