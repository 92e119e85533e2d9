//! Rate Limiter
//!
//! Per-tenant sliding window over the shared rate-window store. The store
//! performs prune/record/count atomically; this service only decides.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use siteline::{DomainError, RateWindowStore};

pub struct RateLimiter {
    store: Arc<dyn RateWindowStore>,
    max_count: u64,
    window: chrono::Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateWindowStore>, max_count: u64, window: Duration) -> Self {
        Self {
            store,
            max_count,
            window: chrono::Duration::milliseconds(window.as_millis() as i64),
        }
    }

    /// Admission decision for one inbound event of `tenant_id`
    pub async fn admit(&self, tenant_id: &str) -> bool {
        self.admit_at(tenant_id, Utc::now()).await
    }

    pub async fn admit_at(&self, tenant_id: &str, now: DateTime<Utc>) -> bool {
        match self
            .store
            .record_hit(tenant_id, now, now - self.window)
            .await
        {
            Ok(count) if count > self.max_count => {
                tracing::warn!(tenant = %tenant_id, count, max = self.max_count, "🚦 Rate limit exceeded");
                false
            }
            Ok(_) => true,
            Err(e) => {
                // Store outage must not block intake
                tracing::warn!(tenant = %tenant_id, "Rate limiter store unavailable, admitting: {}", e);
                true
            }
        }
    }

    /// Drop window entries that can no longer count toward any decision
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        self.store
            .purge_before(now - self.window - chrono::Duration::seconds(1))
            .await
    }
}
