//! PostgreSQL implementation of DefectRepository
//!
//! Sequence numbers are allocated under a transaction-scoped advisory lock
//! keyed by site, so `MAX + 1` cannot race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use siteline::{Defect, DefectPatch, DefectRepository, DomainError, NewDefect};

pub struct PgDefectRepository {
    pool: PgPool,
}

impl PgDefectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DefectRow {
    id: i64,
    defect_id: i32,
    site_id: i64,
    description: String,
    reporter: String,
    supplier: Option<String>,
    location: Option<String>,
    image_url: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DefectRow> for Defect {
    fn from(row: DefectRow) -> Self {
        Self {
            id: row.id,
            defect_id: row.defect_id,
            site_id: row.site_id,
            description: row.description,
            reporter: row.reporter,
            supplier: row.supplier,
            location: row.location,
            image_url: row.image_url,
            status: row.status.parse().unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl DefectRepository for PgDefectRepository {
    async fn create_next(&self, site_id: i64, defect: NewDefect) -> Result<Defect, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended('defects:' || $1::text, 0))")
            .bind(site_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(defect_id), 0) + 1 FROM defects WHERE site_id = $1",
        )
        .bind(site_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        let row = sqlx::query_as::<_, DefectRow>(
            r#"
            INSERT INTO defects (defect_id, site_id, description, reporter, supplier, location, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(next)
        .bind(site_id)
        .bind(&defect.description)
        .bind(&defect.reporter)
        .bind(&defect.supplier)
        .bind(&defect.location)
        .bind(&defect.image_url)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(row.into())
    }

    async fn find(&self, site_id: i64, defect_id: i32) -> Result<Option<Defect>, DomainError> {
        let row = sqlx::query_as::<_, DefectRow>(
            "SELECT * FROM defects WHERE site_id = $1 AND defect_id = $2",
        )
        .bind(site_id)
        .bind(defect_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn list_by_site(&self, site_id: i64) -> Result<Vec<Defect>, DomainError> {
        let rows = sqlx::query_as::<_, DefectRow>(
            "SELECT * FROM defects WHERE site_id = $1 ORDER BY defect_id",
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(
        &self,
        site_id: i64,
        defect_id: i32,
        patch: DefectPatch,
    ) -> Result<Option<Defect>, DomainError> {
        let row = sqlx::query_as::<_, DefectRow>(
            r#"
            UPDATE defects SET
                description = COALESCE($3, description),
                supplier = COALESCE($4, supplier),
                location = COALESCE($5, location),
                image_url = COALESCE($6, image_url),
                status = COALESCE($7, status),
                updated_at = NOW()
            WHERE site_id = $1 AND defect_id = $2
            RETURNING *
            "#,
        )
        .bind(site_id)
        .bind(defect_id)
        .bind(&patch.description)
        .bind(&patch.supplier)
        .bind(&patch.location)
        .bind(&patch.image_url)
        .bind(patch.status.map(|s| s.label()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(row.map(Into::into))
    }
}
