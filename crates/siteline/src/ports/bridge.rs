//! Chat Bridge Port
//!
//! Outbound delivery to a site's chat group and the processing
//! acknowledgment that releases the upstream queue slot.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// One message of a batched send
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchItem {
    pub consolidated_info: String,
}

/// Outbound chat delivery interface
///
/// The four sending operations retry transient failures with bounded
/// exponential backoff inside the implementation. `acknowledge` is called
/// exactly once per processed event by the orchestration engine.
#[async_trait]
pub trait ChatBridge: Send + Sync {
    async fn send_text(&self, group_id: &str, message: &str) -> Result<(), DomainError>;

    async fn send_batch(&self, group_id: &str, items: &[BatchItem]) -> Result<(), DomainError>;

    async fn send_document(
        &self,
        group_id: &str,
        document_url: &str,
        filename: &str,
        caption: &str,
    ) -> Result<(), DomainError>;

    /// Schedule a reminder message in the group at the site's wall-clock time
    async fn schedule_reminder(
        &self,
        group_id: &str,
        name: &str,
        start: NaiveDateTime,
    ) -> Result<(), DomainError>;

    /// Tell the upstream the event is done, successfully or not
    async fn acknowledge(&self, event_id: &str) -> Result<(), DomainError>;
}
