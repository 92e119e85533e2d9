//! PostgreSQL implementation of RateWindowStore
//!
//! Each hit runs prune/insert/count in one transaction holding an advisory
//! lock on the tenant, so concurrent requests for a tenant are serialized.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use siteline::{DomainError, RateWindowStore};

pub struct PgRateWindowStore {
    pool: PgPool,
}

impl PgRateWindowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateWindowStore for PgRateWindowStore {
    async fn record_hit(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended('rate:' || $1, 0))")
            .bind(tenant_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        sqlx::query("DELETE FROM rate_window_entries WHERE tenant_id = $1 AND hit_at <= $2")
            .bind(tenant_id)
            .bind(window_start)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        sqlx::query("INSERT INTO rate_window_entries (tenant_id, hit_at) VALUES ($1, $2)")
            .bind(tenant_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM rate_window_entries WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| DomainError::Repository(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(count.max(0) as u64)
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM rate_window_entries WHERE hit_at <= $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
