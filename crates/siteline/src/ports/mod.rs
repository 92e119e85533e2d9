//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the domain layer
//! interacts with external systems (repositories, services, bridge, queue).
//!
//! Implementations of these traits live in the server crate.

pub mod bridge;
pub mod queue;
pub mod repositories;
pub mod services;

// Re-exports
pub use bridge::*;
pub use queue::*;
pub use repositories::*;
pub use services::*;
