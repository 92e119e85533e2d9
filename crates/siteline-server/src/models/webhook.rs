//! Webhook DTOs
//!
//! Field names follow the chat bridge's camelCase payload.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use siteline::{EventKind, IncomingEvent, MediaKind, MediaRef};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OriginalMessage {
    pub text: Option<String>,
}

/// Chat event as posted by the bridge
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub message_id: String,
    /// Chat group id, e.g. "120363000000000000@g.us"
    pub group_id: String,
    pub sender: String,
    /// Who reacted (reactions only)
    pub reactor: Option<String>,
    pub message_text: Option<String>,
    /// "message" or "reaction"
    #[serde(rename = "type", default = "default_message_type")]
    pub message_type: String,
    pub emoji: Option<String>,
    pub media_url: Option<String>,
    /// "image", "video" or "audio"
    pub media_type: Option<String>,
    pub media_playback_url: Option<String>,
    /// File already uploaded to the transcription provider
    pub soniox_file_id: Option<String>,
    pub original_message: Option<OriginalMessage>,
}

fn default_message_type() -> String {
    "message".to_string()
}

/// Webhook envelope
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WebhookRequest {
    pub body: MessageBody,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl WebhookRequest {
    /// Convert to the domain event; fails on missing ids or an unknown media type
    pub fn into_event(self) -> Result<IncomingEvent, String> {
        let body = self.body;
        if body.message_id.trim().is_empty() {
            return Err("messageId is required".to_string());
        }
        if body.group_id.trim().is_empty() {
            return Err("groupId is required".to_string());
        }

        let transcription_file_id = present(body.soniox_file_id);
        let media_kind = match present(body.media_type) {
            Some(raw) => Some(raw.parse::<MediaKind>()?),
            None if transcription_file_id.is_some() => Some(MediaKind::Audio),
            None => None,
        };
        let media = media_kind.map(|kind| MediaRef {
            kind,
            url: present(body.media_url),
            playback_url: present(body.media_playback_url),
            transcription_file_id,
        });

        let kind = if body.message_type.eq_ignore_ascii_case("reaction") {
            EventKind::Reaction
        } else if media.is_some() {
            EventKind::Media
        } else {
            EventKind::Text
        };

        Ok(IncomingEvent {
            event_id: body.message_id,
            tenant_id: body.group_id,
            sender_id: body.sender,
            kind,
            text: present(body.message_text),
            media,
            reaction_emoji: present(body.emoji),
            reactor_id: present(body.reactor),
            replied_to_text: body.original_message.and_then(|m| present(m.text)),
        })
    }
}

/// Intake result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookResponse {
    /// "accepted" or "duplicate"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}
