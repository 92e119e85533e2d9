//! IncomingEvent - Inbound chat-platform event
//!
//! Produced by the upstream bridge, admitted by the intake gateway, and
//! carried unchanged as the queue payload into the orchestration engine.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{EventKind, MediaKind};

/// Pointer to media attached to an event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRef {
    pub kind: MediaKind,
    /// Publicly reachable URL (images are passed through to the reasoning step)
    pub url: Option<String>,
    /// Playback URL for audio/video
    pub playback_url: Option<String>,
    /// Pre-uploaded file handle at the transcription provider
    pub transcription_file_id: Option<String>,
}

/// Immutable inbound event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncomingEvent {
    /// Opaque id, globally unique per source
    pub event_id: String,
    /// Tenant (chat group) id
    pub tenant_id: String,
    pub sender_id: String,
    pub kind: EventKind,
    pub text: Option<String>,
    pub media: Option<MediaRef>,
    pub reaction_emoji: Option<String>,
    /// Who reacted, for reaction events
    pub reactor_id: Option<String>,
    /// Text of the message a reaction or reply points at
    pub replied_to_text: Option<String>,
}

impl IncomingEvent {
    /// Plain text event
    pub fn text(
        event_id: impl Into<String>,
        tenant_id: impl Into<String>,
        sender_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            tenant_id: tenant_id.into(),
            sender_id: sender_id.into(),
            kind: EventKind::Text,
            text: Some(text.into()),
            media: None,
            reaction_emoji: None,
            reactor_id: None,
            replied_to_text: None,
        }
    }

    /// Conversation session key; one session per tenant
    pub fn session_key(&self) -> String {
        format!("group_{}", self.tenant_id)
    }

    pub fn is_reaction(&self) -> bool {
        self.kind == EventKind::Reaction
    }

    /// Image URL to hand to the reasoning step, if any
    pub fn image_url(&self) -> Option<&str> {
        self.media
            .as_ref()
            .filter(|m| m.kind == MediaKind::Image)
            .and_then(|m| m.url.as_deref())
    }

    /// Audio handle that needs transcription, if any
    pub fn transcription_file_id(&self) -> Option<&str> {
        self.media
            .as_ref()
            .and_then(|m| m.transcription_file_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Reaction context, present only for reactions that reference a message
    pub fn reaction_context(&self) -> Option<ReactionContext> {
        if !self.is_reaction() {
            return None;
        }
        let replied = self.replied_to_text.as_deref().filter(|t| !t.is_empty())?;
        Some(ReactionContext {
            emoji: self.reaction_emoji.clone().unwrap_or_default(),
            replied_to_text: replied.to_string(),
        })
    }
}

/// Reaction details carried into a turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionContext {
    pub emoji: String,
    pub replied_to_text: String,
}
