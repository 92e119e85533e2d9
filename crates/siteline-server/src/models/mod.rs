//! Siteline HTTP Models
//!
//! - Webhook: inbound chat events from the bridge
//! - Site: administrative site management

mod site;
mod webhook;

pub use site::*;
pub use webhook::*;
