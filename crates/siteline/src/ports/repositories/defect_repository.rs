//! Defect Repository Port

use async_trait::async_trait;

use crate::domain::{errors::DomainError, Defect, DefectPatch, NewDefect};

/// Repository interface for Defect entities
#[async_trait]
pub trait DefectRepository: Send + Sync {
    /// Insert a defect with the next per-site sequence number.
    ///
    /// Allocation and insert are atomic: concurrent calls for one site never
    /// receive the same number.
    async fn create_next(&self, site_id: i64, defect: NewDefect) -> Result<Defect, DomainError>;

    /// Find by per-site sequence number
    async fn find(&self, site_id: i64, defect_id: i32) -> Result<Option<Defect>, DomainError>;

    /// All defects of a site ordered by sequence number
    async fn list_by_site(&self, site_id: i64) -> Result<Vec<Defect>, DomainError>;

    /// Apply a partial update; `None` when the defect does not exist
    async fn update(
        &self,
        site_id: i64,
        defect_id: i32,
        patch: DefectPatch,
    ) -> Result<Option<Defect>, DomainError>;
}
