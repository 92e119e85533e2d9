//! Intake Gateway
//!
//! Admission control for inbound events: authentication, per-tenant rate
//! limiting, deduplication, then handoff to the durable queue.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use siteline::{IncomingEvent, JobQueue, PROCESS_MESSAGE_JOB};

use super::{Deduplicator, RateLimiter};
use crate::auth::secret_matches;

/// Successful admission outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted { job_id: Uuid },
    /// Already admitted earlier; nothing was enqueued
    Duplicate,
}

/// Admission rejection
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Temporarily unavailable: {0}")]
    Unavailable(String),
}

pub struct IntakeGateway {
    webhook_secret: String,
    rate_limiter: Arc<RateLimiter>,
    dedup: Arc<Deduplicator>,
    queue: Arc<dyn JobQueue>,
}

impl IntakeGateway {
    pub fn new(
        webhook_secret: impl Into<String>,
        rate_limiter: Arc<RateLimiter>,
        dedup: Arc<Deduplicator>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            rate_limiter,
            dedup,
            queue,
        }
    }

    pub fn authenticate(&self, presented_secret: Option<&str>) -> Result<(), IntakeError> {
        if secret_matches(&self.webhook_secret, presented_secret) {
            Ok(())
        } else {
            tracing::warn!("Rejected webhook with missing or invalid secret");
            Err(IntakeError::Unauthenticated)
        }
    }

    /// Admit one event.
    ///
    /// The dedup record is committed before the enqueue. If the enqueue then
    /// fails, the record is released again and the caller gets
    /// `Unavailable`, so a redelivery is admitted instead of being treated as
    /// a duplicate.
    pub async fn admit(
        &self,
        presented_secret: Option<&str>,
        event: IncomingEvent,
    ) -> Result<Admission, IntakeError> {
        self.authenticate(presented_secret)?;

        if event.event_id.trim().is_empty() || event.tenant_id.trim().is_empty() {
            return Err(IntakeError::InvalidEvent(
                "event id and tenant id are required".to_string(),
            ));
        }
        let payload = serde_json::to_value(&event)
            .map_err(|e| IntakeError::InvalidEvent(e.to_string()))?;

        if !self.rate_limiter.admit(&event.tenant_id).await {
            return Err(IntakeError::RateLimited);
        }

        let already = self
            .dedup
            .is_processed(&event.event_id)
            .await
            .map_err(|e| IntakeError::Unavailable(e.to_string()))?;
        if already {
            tracing::info!(event_id = %event.event_id, tenant = %event.tenant_id, "♻️ Duplicate event ignored");
            return Ok(Admission::Duplicate);
        }

        let recorded = self
            .dedup
            .mark_processed(&event.event_id, &event.tenant_id)
            .await
            .map_err(|e| IntakeError::Unavailable(e.to_string()))?;
        if !recorded {
            tracing::info!(event_id = %event.event_id, tenant = %event.tenant_id, "♻️ Duplicate event lost admission race");
            return Ok(Admission::Duplicate);
        }

        match self.queue.enqueue(PROCESS_MESSAGE_JOB, payload).await {
            Ok(job_id) => {
                tracing::info!(
                    event_id = %event.event_id,
                    tenant = %event.tenant_id,
                    kind = %event.kind,
                    job_id = %job_id,
                    "📥 Event accepted"
                );
                Ok(Admission::Accepted { job_id })
            }
            Err(e) => {
                tracing::error!(event_id = %event.event_id, "Enqueue failed after dedup commit: {}", e);
                if let Err(release_err) = self.dedup.release(&event.event_id).await {
                    tracing::error!(
                        event_id = %event.event_id,
                        "Event recorded as processed but never queued: {}",
                        release_err
                    );
                }
                Err(IntakeError::Unavailable(format!("queue unavailable: {e}")))
            }
        }
    }
}
