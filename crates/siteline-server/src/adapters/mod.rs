//! Infrastructure Adapters
//!
//! Implementations of the domain ports:
//! - postgres: repositories, job queue, rate window (sqlx)
//! - bridge: outbound chat bridge (reqwest)
//! - openai / soniox / pdfmonkey: external collaborators (reqwest)
//! - memory_cache: in-process site context cache (dashmap)

pub mod bridge;
pub mod memory_cache;
pub mod openai;
pub mod pdfmonkey;
pub mod postgres;
pub mod soniox;

pub use bridge::{HttpChatBridge, RetryPolicy};
pub use memory_cache::MemoryContextCache;
pub use openai::OpenAiReasoner;
pub use pdfmonkey::PdfMonkeyReports;
pub use postgres::*;
pub use soniox::SonioxTranscriber;
