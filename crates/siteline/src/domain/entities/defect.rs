//! Defect - Construction defect logged for a site

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::DefectStatus;

/// Logged defect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defect {
    pub id: i64,
    /// Per-site sequence number, starting at 1
    pub defect_id: i32,
    pub site_id: i64,
    pub description: String,
    /// Sender who reported it
    pub reporter: String,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub status: DefectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new defect; the sequence number is allocated by the repository
#[derive(Debug, Clone)]
pub struct NewDefect {
    pub description: String,
    pub reporter: String,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
}

/// Partial defect update
#[derive(Debug, Clone, Default)]
pub struct DefectPatch {
    pub description: Option<String>,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<DefectStatus>,
}

impl DefectPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.supplier.is_none()
            && self.location.is_none()
            && self.image_url.is_none()
            && self.status.is_none()
    }
}
