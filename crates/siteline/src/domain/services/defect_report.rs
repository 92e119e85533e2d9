//! Defect report formatting and filtering
//!
//! Defect lists are sent to the chat group as one line per defect, grouped
//! into batches so a single outbound message stays readable.

use std::collections::BTreeSet;

use crate::domain::{entities::Defect, errors::DomainError, value_objects::DefectStatus};

/// Defect rows per outbound batch message
pub const REPORT_BATCH_SIZE: usize = 20;

/// One defect as a single chat line: `#id | location | supplier | description | [status]`
pub fn format_defect_row(defect: &Defect) -> String {
    let mut parts = vec![format!("#{}", defect.defect_id)];
    if let Some(location) = defect.location.as_deref().filter(|s| !s.is_empty()) {
        parts.push(location.to_string());
    }
    if let Some(supplier) = defect.supplier.as_deref().filter(|s| !s.is_empty()) {
        parts.push(supplier.to_string());
    }
    parts.push(defect.description.clone());
    parts.push(format!("[{}]", defect.status));
    parts.join(" | ")
}

/// Rows grouped into newline-joined batches of at most `batch_size` lines
pub fn batch_rows(defects: &[Defect], batch_size: usize) -> Vec<String> {
    defects
        .chunks(batch_size.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(format_defect_row)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}

/// Parse `"77-90"` (inclusive range) or `"5,7,12"` (list)
pub fn parse_id_filter(raw: &str) -> Result<BTreeSet<i32>, DomainError> {
    let invalid = || DomainError::Validation(format!("Invalid defect id filter: {raw}"));
    let raw = raw.trim();

    if let Some((lo, hi)) = raw.split_once('-') {
        let lo: i32 = lo.trim().parse().map_err(|_| invalid())?;
        let hi: i32 = hi.trim().parse().map_err(|_| invalid())?;
        return Ok((lo..=hi).collect());
    }

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<i32>().map_err(|_| invalid()))
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Filter over a site's defects; every set criterion must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefectFilter {
    pub status: Option<DefectStatus>,
    /// Case-insensitive substring
    pub description: Option<String>,
    /// Exact supplier name
    pub supplier: Option<String>,
    pub ids: Option<BTreeSet<i32>>,
}

impl DefectFilter {
    /// Build from the free-form tool arguments; empty strings mean "any"
    pub fn from_args(
        status: Option<&str>,
        description: Option<&str>,
        supplier: Option<&str>,
        ids: Option<&str>,
    ) -> Result<Self, DomainError> {
        let status = non_empty(status)
            .map(|s| s.parse::<DefectStatus>().map_err(DomainError::Validation))
            .transpose()?;
        let ids = non_empty(ids).map(parse_id_filter).transpose()?;

        Ok(Self {
            status,
            description: non_empty(description).map(str::to_lowercase),
            supplier: non_empty(supplier).map(str::to_string),
            ids,
        })
    }

    pub fn matches(&self, defect: &Defect) -> bool {
        if self.status.is_some_and(|s| s != defect.status) {
            return false;
        }
        if let Some(needle) = &self.description {
            if !defect.description.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(supplier) = &self.supplier {
            if defect.supplier.as_deref() != Some(supplier.as_str()) {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&defect.defect_id) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, defects: Vec<Defect>) -> Vec<Defect> {
        defects.into_iter().filter(|d| self.matches(d)).collect()
    }
}
