//! PostgreSQL implementation of JobQueue
//!
//! Jobs are claimed with `FOR UPDATE SKIP LOCKED` and held under a lease.
//! A claim counts as an attempt; failed attempts go back to `pending` with
//! exponential backoff until `max_attempts`, then to `dead`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use siteline::{DomainError, Job, JobQueue, JobStatus};

/// Retry and lease policy applied to every job
#[derive(Debug, Clone)]
pub struct QueuePolicy {
    pub max_attempts: i32,
    /// How long a claimed job stays invisible to other workers
    pub lease: Duration,
    /// Delay before the first retry; doubles per attempt
    pub retry_base_delay: Duration,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            lease: Duration::from_secs(330),
            retry_base_delay: Duration::from_secs(5),
        }
    }
}

pub struct PgJobQueue {
    pool: PgPool,
    policy: QueuePolicy,
}

impl PgJobQueue {
    pub fn new(pool: PgPool, policy: QueuePolicy) -> Self {
        Self { pool, policy }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    name: String,
    payload: serde_json::Value,
    status: String,
    attempts: i32,
    max_attempts: i32,
    last_error: Option<String>,
    run_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            payload: row.payload,
            status: row.status.parse().unwrap_or(JobStatus::Pending),
            attempts: row.attempts,
            max_attempts: row.max_attempts,
            last_error: row.last_error,
            run_at: row.run_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue(&self, name: &str, payload: serde_json::Value) -> Result<Uuid, DomainError> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO jobs (id, name, payload, max_attempts)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(payload)
        .bind(self.policy.max_attempts)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(id)
    }

    async fn dequeue(&self, name: &str) -> Result<Option<Job>, DomainError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs SET
                status = 'running',
                attempts = attempts + 1,
                locked_until = NOW() + make_interval(secs => $2),
                updated_at = NOW()
            WHERE id = (
                SELECT id FROM jobs
                WHERE name = $1 AND status = 'pending' AND run_at <= NOW()
                ORDER BY run_at
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING id, name, payload, status, attempts, max_attempts, last_error, run_at, created_at
            "#,
        )
        .bind(name)
        .bind(self.policy.lease.as_secs_f64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn complete(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE jobs SET status = 'completed', locked_until = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<JobStatus, DomainError> {
        let status = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE jobs SET
                status = CASE WHEN attempts >= max_attempts THEN 'dead' ELSE 'pending' END,
                run_at = CASE
                    WHEN attempts >= max_attempts THEN run_at
                    ELSE NOW() + make_interval(secs => $3 * power(2, attempts - 1))
                END,
                last_error = $2,
                locked_until = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING status
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(self.policy.retry_base_delay.as_secs_f64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?
        .ok_or_else(|| DomainError::not_found("Job", id))?;

        status.parse().map_err(DomainError::Repository)
    }

    async fn dead_letter(&self, id: Uuid, error: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE jobs SET status = 'dead', last_error = $2, locked_until = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(())
    }

    async fn requeue_expired(&self) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs SET
                status = CASE WHEN attempts >= max_attempts THEN 'dead' ELSE 'pending' END,
                last_error = COALESCE(last_error, 'lease expired'),
                locked_until = NULL,
                updated_at = NOW()
            WHERE status = 'running' AND locked_until < NOW()
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
