//! DefectStatus - Lifecycle of a logged defect
//!
//! Stored and displayed with the Hebrew labels the site crews use.

use serde::{Deserialize, Serialize};

/// Defect status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
pub enum DefectStatus {
    #[default]
    #[serde(rename = "פתוח")]
    Open,
    #[serde(rename = "בעבודה")]
    InProgress,
    #[serde(rename = "סגור")]
    Closed,
}

impl DefectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DefectStatus::Open => "פתוח",
            DefectStatus::InProgress => "בעבודה",
            DefectStatus::Closed => "סגור",
        }
    }
}

impl std::fmt::Display for DefectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for DefectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "פתוח" => Ok(DefectStatus::Open),
            "בעבודה" => Ok(DefectStatus::InProgress),
            "סגור" => Ok(DefectStatus::Closed),
            other => match other.to_lowercase().as_str() {
                "open" => Ok(DefectStatus::Open),
                "in_progress" | "in progress" => Ok(DefectStatus::InProgress),
                "closed" => Ok(DefectStatus::Closed),
                _ => Err(format!("Unknown defect status: {}", s)),
            },
        }
    }
}
