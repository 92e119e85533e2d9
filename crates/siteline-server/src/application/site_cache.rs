//! Site Context Cache
//!
//! Read-through cache of site projections keyed by tenant id. Misses are
//! not cached, and a failing cache store is bypassed.

use std::sync::Arc;
use std::time::Duration;

use siteline::{CachedSite, ContextCacheStore, DomainError, SiteRepository};

pub struct SiteContextCache {
    repo: Arc<dyn SiteRepository>,
    store: Arc<dyn ContextCacheStore>,
    ttl: Duration,
}

fn cache_key(tenant_id: &str) -> String {
    format!("site:{tenant_id}")
}

impl SiteContextCache {
    pub fn new(
        repo: Arc<dyn SiteRepository>,
        store: Arc<dyn ContextCacheStore>,
        ttl: Duration,
    ) -> Self {
        Self { repo, store, ttl }
    }

    pub async fn get(&self, tenant_id: &str) -> Result<Option<CachedSite>, DomainError> {
        let key = cache_key(tenant_id);

        match self.store.get(&key).await {
            Ok(Some(site)) => return Ok(Some(site)),
            Ok(None) => {}
            Err(e) => tracing::warn!(tenant = %tenant_id, "Site cache read failed, bypassing: {}", e),
        }

        let Some(site) = self.repo.find_by_group_id(tenant_id).await? else {
            return Ok(None);
        };
        let cached = CachedSite::from(site);

        if let Err(e) = self.store.set(&key, &cached, self.ttl).await {
            tracing::warn!(tenant = %tenant_id, "Site cache write failed: {}", e);
        }

        Ok(Some(cached))
    }

    /// Remove the cached entry; a missing entry is fine
    pub async fn invalidate(&self, tenant_id: &str) -> Result<(), DomainError> {
        self.store.delete(&cache_key(tenant_id)).await?;
        tracing::debug!(tenant = %tenant_id, "Site cache invalidated");
        Ok(())
    }
}
