//! Conversation Repository Port
//!
//! Persists the history part of a conversation session.

use async_trait::async_trait;

use crate::domain::{errors::DomainError, ConversationEntry};

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Stored history for a session; empty when none exists
    async fn load(&self, session_key: &str) -> Result<Vec<ConversationEntry>, DomainError>;

    /// Replace the stored history
    async fn save(&self, session_key: &str, history: &[ConversationEntry])
        -> Result<(), DomainError>;

    /// Drop the stored history
    async fn clear(&self, session_key: &str) -> Result<(), DomainError>;
}
