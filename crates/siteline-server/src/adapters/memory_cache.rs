//! In-process site context cache
//!
//! Entries carry their own expiry; expired entries are dropped when read
//! and by the periodic sweep.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use siteline::{CachedSite, ContextCacheStore, DomainError};

#[derive(Default)]
pub struct MemoryContextCache {
    entries: DashMap<String, (CachedSite, Instant)>,
}

impl MemoryContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all expired entries; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl ContextCacheStore for MemoryContextCache {
    async fn get(&self, key: &str) -> Result<Option<CachedSite>, DomainError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            let (site, expires_at) = entry.value();
            if *expires_at > now {
                return Ok(Some(site.clone()));
            }
        }
        // Guard dropped above; safe to remove
        self.entries.remove_if(key, |_, (_, expires_at)| *expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, site: &CachedSite, ttl: Duration) -> Result<(), DomainError> {
        self.entries
            .insert(key.to_string(), (site.clone(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        self.entries.remove(key);
        Ok(())
    }
}
