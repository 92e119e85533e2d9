//! ProcessedEvent - Write-once deduplication record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedEvent {
    pub event_id: String,
    pub tenant_id: String,
    pub processed_at: DateTime<Utc>,
}
