//! PostgreSQL adapters
//!
//! sqlx implementations of the repository, queue, and rate-window ports.

mod conversation_repository;
mod defect_repository;
mod job_queue;
mod processed_event_repository;
mod rate_window;
mod site_repository;

pub use conversation_repository::PgConversationRepository;
pub use defect_repository::PgDefectRepository;
pub use job_queue::{PgJobQueue, QueuePolicy};
pub use processed_event_repository::PgProcessedEventRepository;
pub use rate_window::PgRateWindowStore;
pub use site_repository::PgSiteRepository;
