//! Context Cache Store Port
//!
//! Key/value store with TTL holding cached site projections.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{errors::DomainError, CachedSite};

#[async_trait]
pub trait ContextCacheStore: Send + Sync {
    /// Unexpired entry for `key`, if any
    async fn get(&self, key: &str) -> Result<Option<CachedSite>, DomainError>;

    async fn set(&self, key: &str, site: &CachedSite, ttl: Duration) -> Result<(), DomainError>;

    /// Remove `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), DomainError>;
}
