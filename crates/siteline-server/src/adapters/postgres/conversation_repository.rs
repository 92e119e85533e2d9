//! PostgreSQL implementation of ConversationRepository
//!
//! History is stored as one JSONB array per session key.

use async_trait::async_trait;
use sqlx::PgPool;

use siteline::{ConversationEntry, ConversationRepository, DomainError};

pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn load(&self, session_key: &str) -> Result<Vec<ConversationEntry>, DomainError> {
        let history = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT history FROM conversations WHERE session_key = $1",
        )
        .bind(session_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        let Some(history) = history else {
            return Ok(Vec::new());
        };

        Ok(serde_json::from_value(history).unwrap_or_else(|e| {
            tracing::warn!(session_key, "Discarding unreadable conversation history: {}", e);
            Vec::new()
        }))
    }

    async fn save(
        &self,
        session_key: &str,
        history: &[ConversationEntry],
    ) -> Result<(), DomainError> {
        let history =
            serde_json::to_value(history).map_err(|e| DomainError::Repository(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO conversations (session_key, history, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (session_key) DO UPDATE
            SET history = EXCLUDED.history, updated_at = NOW()
            "#,
        )
        .bind(session_key)
        .bind(history)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self, session_key: &str) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM conversations WHERE session_key = $1")
            .bind(session_key)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(())
    }
}
