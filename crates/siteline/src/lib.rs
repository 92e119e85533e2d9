//! Siteline Domain Library
//!
//! Core domain types and interfaces for the Siteline site-defect assistant.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core domain models (IncomingEvent, Site, Defect, ConversationState, Job)
//!   - `value_objects/`: Immutable value types (DefectStatus, EventKind, MediaKind)
//!   - `services/`: Pure domain logic (defect formatting and filtering)
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Data access interfaces
//!   - `services/`: External collaborator interfaces (reasoning, transcription, reports, stores)
//!   - `bridge`: Outbound chat delivery and acknowledgment
//!   - `queue`: Durable job queue
//!
//! # Usage
//!
//! ```rust,ignore
//! use siteline::domain::{IncomingEvent, Site, Defect};
//! use siteline::ports::{SiteRepository, ChatBridge};
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    batch_rows, format_defect_row, parse_id_filter, CachedSite, ConversationEntry,
    ConversationState, Defect, DefectFilter, DefectPatch, DefectStatus, DomainError, EventKind,
    IncomingEvent, Job, JobStatus, MediaKind, MediaRef, NewDefect, NewSite, ProcessedEvent,
    ReactionContext, Site, SiteContext, SitePatch, ToolInvocation, DISABLED_PHASE,
    PROCESS_MESSAGE_JOB, REPORT_BATCH_SIZE,
};
pub use ports::{
    // Outbound
    BatchItem,
    ChatBridge,
    // Stores
    ContextCacheStore,
    // Repositories
    ConversationRepository,
    DefectRepository,
    JobQueue,
    ProcessedEventRepository,
    RateWindowStore,
    // Collaborators
    ReasoningProvider,
    ReasoningResponse,
    ReportGenerator,
    ReportRequest,
    ReportRow,
    SiteRepository,
    ToolDefinition,
    Transcriber,
    TranscriptionContext,
};
