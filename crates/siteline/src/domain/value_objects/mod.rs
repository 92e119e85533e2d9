//! Value Objects
//!
//! Immutable value types used across entities.

mod defect_status;
mod event_kind;

pub use defect_status::DefectStatus;
pub use event_kind::{EventKind, MediaKind};
