//! Siteline API Routes
//!
//! - /webhook/agent - Inbound chat events from the bridge
//! - /admin/sites - Site management (X-Admin-Key)

pub mod admin;
pub mod swagger;
pub mod webhook;
