//! Deduplicator
//!
//! Durable record of admitted event ids. Recording is a conflict-free
//! insert; the caller that creates the record owns the event.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use siteline::{DomainError, ProcessedEventRepository};

pub struct Deduplicator {
    repo: Arc<dyn ProcessedEventRepository>,
}

impl Deduplicator {
    pub fn new(repo: Arc<dyn ProcessedEventRepository>) -> Self {
        Self { repo }
    }

    pub async fn is_processed(&self, event_id: &str) -> Result<bool, DomainError> {
        self.repo.is_processed(event_id).await
    }

    /// Record the event as processed; `true` when this call recorded it
    pub async fn mark_processed(&self, event_id: &str, tenant_id: &str) -> Result<bool, DomainError> {
        let recorded = self.repo.mark_processed(event_id, tenant_id).await?;
        if !recorded {
            tracing::debug!(event_id, "Event already recorded by a concurrent attempt");
        }
        Ok(recorded)
    }

    /// Undo a record whose event never reached the queue
    pub async fn release(&self, event_id: &str) -> Result<(), DomainError> {
        self.repo.release(event_id).await
    }

    pub async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        self.repo.prune_before(cutoff).await
    }
}
