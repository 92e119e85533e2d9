//! Processed Event Repository Port
//!
//! Durable write-once record of admitted event ids.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainError;

#[async_trait]
pub trait ProcessedEventRepository: Send + Sync {
    async fn is_processed(&self, event_id: &str) -> Result<bool, DomainError>;

    /// Conflict-free insert, committed before returning.
    ///
    /// Returns `true` when this call created the record and `false` when it
    /// already existed. A repeated call is never an error.
    async fn mark_processed(&self, event_id: &str, tenant_id: &str) -> Result<bool, DomainError>;

    /// Remove a record so the event can be admitted again
    async fn release(&self, event_id: &str) -> Result<(), DomainError>;

    /// Delete records processed before `cutoff`; returns the number removed
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}
