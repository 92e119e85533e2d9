//! PostgreSQL implementation of SiteRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use siteline::{DomainError, NewSite, Site, SiteContext, SitePatch, SiteRepository};

pub struct PgSiteRepository {
    pool: PgPool,
}

impl PgSiteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct SiteRow {
    id: i64,
    group_id: String,
    name: Option<String>,
    logo_url: Option<String>,
    training_phase: String,
    context: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SiteRow> for Site {
    fn from(row: SiteRow) -> Self {
        let context: SiteContext = serde_json::from_value(row.context).unwrap_or_else(|e| {
            tracing::warn!(group_id = %row.group_id, "Unreadable site context, using empty: {}", e);
            SiteContext::default()
        });

        Self {
            id: row.id,
            group_id: row.group_id,
            name: row.name,
            logo_url: row.logo_url,
            training_phase: row.training_phase,
            context,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn context_json(context: &SiteContext) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(context).map_err(|e| DomainError::Validation(e.to_string()))
}

#[async_trait]
impl SiteRepository for PgSiteRepository {
    async fn find_by_group_id(&self, group_id: &str) -> Result<Option<Site>, DomainError> {
        let row = sqlx::query_as::<_, SiteRow>("SELECT * FROM sites WHERE group_id = $1")
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn find_all(&self) -> Result<Vec<Site>, DomainError> {
        let rows = sqlx::query_as::<_, SiteRow>("SELECT * FROM sites ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, site: NewSite) -> Result<Site, DomainError> {
        let context = context_json(&site.context)?;

        let row = sqlx::query_as::<_, SiteRow>(
            r#"
            INSERT INTO sites (group_id, name, logo_url, training_phase, context)
            VALUES ($1, $2, $3, COALESCE($4, 'Active'), $5)
            ON CONFLICT (group_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&site.group_id)
        .bind(&site.name)
        .bind(&site.logo_url)
        .bind(&site.training_phase)
        .bind(context)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        row.map(Into::into).ok_or_else(|| {
            DomainError::Conflict(format!("Site for group {} already exists", site.group_id))
        })
    }

    async fn update(&self, group_id: &str, patch: SitePatch) -> Result<Option<Site>, DomainError> {
        let context = patch.context.as_ref().map(context_json).transpose()?;

        let row = sqlx::query_as::<_, SiteRow>(
            r#"
            UPDATE sites SET
                name = COALESCE($2, name),
                logo_url = COALESCE($3, logo_url),
                training_phase = COALESCE($4, training_phase),
                context = COALESCE($5, context),
                updated_at = NOW()
            WHERE group_id = $1
            RETURNING *
            "#,
        )
        .bind(group_id)
        .bind(&patch.name)
        .bind(&patch.logo_url)
        .bind(&patch.training_phase)
        .bind(context)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(row.map(Into::into))
    }
}
