//! Domain Layer
//!
//! Pure business entities, value objects, and domain logic.

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use services::*;
pub use value_objects::*;
