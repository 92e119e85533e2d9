//! Repository Ports
//!
//! Data access interfaces for domain entities.

mod conversation_repository;
mod defect_repository;
mod processed_event_repository;
mod site_repository;

pub use conversation_repository::*;
pub use defect_repository::*;
pub use processed_event_repository::*;
pub use site_repository::*;
