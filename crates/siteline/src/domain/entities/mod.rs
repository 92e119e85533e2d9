//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - IncomingEvent: Inbound chat event from the bridge
//! - Site: Tenant configuration and its cached projection
//! - Defect: Logged construction defect
//! - ConversationState: Per-session orchestration state
//! - Job: Durable queue entry
//! - ProcessedEvent: Deduplication record

mod conversation;
mod defect;
mod event;
mod job;
mod processed_event;
mod site;

pub use conversation::*;
pub use defect::*;
pub use event::*;
pub use job::*;
pub use processed_event::*;
pub use site::*;
