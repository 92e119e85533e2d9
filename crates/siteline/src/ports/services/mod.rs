//! Service Ports
//!
//! External collaborator and shared-store interfaces.

mod context_cache;
mod rate_window;
mod reasoning;
mod report;
mod transcription;

pub use context_cache::*;
pub use rate_window::*;
pub use reasoning::*;
pub use report::*;
pub use transcription::*;
