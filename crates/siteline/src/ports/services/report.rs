//! Report Generator Port
//!
//! Renders a defect report document and returns its download URL.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{errors::DomainError, Defect};

/// Report row as consumed by the document template
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportRow {
    pub defect_id: i32,
    pub description: String,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub reporter: String,
}

impl From<&Defect> for ReportRow {
    fn from(defect: &Defect) -> Self {
        Self {
            defect_id: defect.defect_id,
            description: defect.description.clone(),
            supplier: defect.supplier.clone(),
            location: defect.location.clone(),
            status: defect.status.to_string(),
            reporter: defect.reporter.clone(),
        }
    }
}

/// Template data for one report
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportRequest {
    pub site_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub defects: Vec<ReportRow>,
}

#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Generate the document and return its download URL
    async fn generate(&self, request: &ReportRequest) -> Result<String, DomainError>;
}
