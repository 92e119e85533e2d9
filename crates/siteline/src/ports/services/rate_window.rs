//! Rate Window Store Port
//!
//! Shared counter store behind the per-tenant sliding window.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainError;

#[async_trait]
pub trait RateWindowStore: Send + Sync {
    /// Atomically, per tenant: drop entries at or before `window_start`,
    /// record `now`, and return the number of entries now in the window
    /// (including this one).
    async fn record_hit(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
    ) -> Result<u64, DomainError>;

    /// Drop every entry at or before `cutoff` across all tenants
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}
