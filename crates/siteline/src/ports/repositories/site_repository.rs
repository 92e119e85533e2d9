//! Site Repository Port
//!
//! System of record for tenant configuration.

use async_trait::async_trait;

use crate::domain::{errors::DomainError, NewSite, Site, SitePatch};

/// Repository interface for Site entities
#[async_trait]
pub trait SiteRepository: Send + Sync {
    /// Find a site by its chat group id
    async fn find_by_group_id(&self, group_id: &str) -> Result<Option<Site>, DomainError>;

    /// Find all sites, newest first
    async fn find_all(&self) -> Result<Vec<Site>, DomainError>;

    /// Insert a new site; a duplicate group id is a `Conflict`
    async fn create(&self, site: NewSite) -> Result<Site, DomainError>;

    /// Apply a partial update; `None` when the site does not exist
    async fn update(&self, group_id: &str, patch: SitePatch) -> Result<Option<Site>, DomainError>;
}
