//! Domain Services
//!
//! Pure logic over domain entities.

mod defect_report;

pub use defect_report::*;
