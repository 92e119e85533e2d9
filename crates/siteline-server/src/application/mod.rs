//! Application Layer (Use Cases)
//!
//! Intake admission, the orchestration engine and the site tools, wired
//! to repositories and collaborators through the domain ports.

mod deduplicator;
mod intake;
mod orchestrator;
mod prompt;
mod rate_limiter;
mod site_cache;
mod site_service;
pub mod tools;

pub use deduplicator::Deduplicator;
pub use intake::{Admission, IntakeError, IntakeGateway};
pub use orchestrator::{EngineSettings, Orchestrator, TurnOutcome};
pub use prompt::build_instruction;
pub use rate_limiter::RateLimiter;
pub use site_cache::SiteContextCache;
pub use site_service::SiteService;
pub use tools::{ToolDeps, ToolRegistry};
