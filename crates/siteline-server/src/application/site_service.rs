//! Site Application Service (Use Case)
//!
//! Administrative writes to sites. Every write invalidates the cached
//! projection before it returns.

use std::sync::Arc;

use siteline::{DomainError, NewSite, Site, SitePatch, SiteRepository, DISABLED_PHASE};

use super::SiteContextCache;

pub struct SiteService {
    repo: Arc<dyn SiteRepository>,
    cache: Arc<SiteContextCache>,
}

impl SiteService {
    pub fn new(repo: Arc<dyn SiteRepository>, cache: Arc<SiteContextCache>) -> Self {
        Self { repo, cache }
    }

    pub async fn list_all(&self) -> Result<Vec<Site>, DomainError> {
        self.repo.find_all().await
    }

    pub async fn get(&self, group_id: &str) -> Result<Option<Site>, DomainError> {
        self.repo.find_by_group_id(group_id).await
    }

    pub async fn create(&self, site: NewSite) -> Result<Site, DomainError> {
        if site.group_id.trim().is_empty() {
            return Err(DomainError::Validation("group_id must not be empty".to_string()));
        }

        let saved = self.repo.create(site).await?;
        self.cache.invalidate(&saved.group_id).await?;

        tracing::info!("🏗️ Created site {} ({})", saved.group_id, saved.id);
        Ok(saved)
    }

    /// Partial update; `None` when the site does not exist
    pub async fn update(&self, group_id: &str, patch: SitePatch) -> Result<Option<Site>, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::Validation("No fields to update".to_string()));
        }

        let updated = self.repo.update(group_id, patch).await?;
        if updated.is_some() {
            self.cache.invalidate(group_id).await?;
            tracing::info!("🏗️ Updated site {}", group_id);
        }
        Ok(updated)
    }

    /// Soft delete: the site stays in the database but stops being served
    pub async fn disable(&self, group_id: &str) -> Result<Option<Site>, DomainError> {
        self.update(
            group_id,
            SitePatch {
                training_phase: Some(DISABLED_PHASE.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_logo(&self, group_id: &str, logo_url: &str) -> Result<Option<Site>, DomainError> {
        self.update(
            group_id,
            SitePatch {
                logo_url: Some(logo_url.to_string()),
                ..Default::default()
            },
        )
        .await
    }
}
