//! ConversationState - Per-session orchestration state
//!
//! Only `history` outlives a turn; the counters and the per-turn media and
//! reaction fields are reset every time a turn starts.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{MediaRef, ReactionContext};

/// Tool call requested by the reasoning step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocation {
    /// Provider-assigned call id, echoed back with the result
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// One entry of the conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ConversationEntry {
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
    },
    Tool {
        call_id: String,
        name: String,
        content: String,
    },
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Assistant text that can be delivered as a reply
    pub fn reply_text(&self) -> Option<&str> {
        match self {
            Self::Assistant {
                content: Some(text),
                tool_calls,
            } if tool_calls.is_empty() && !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn requests_tools(&self) -> bool {
        matches!(self, Self::Assistant { tool_calls, .. } if !tool_calls.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub session_key: String,
    pub history: Vec<ConversationEntry>,
    pub tool_call_occurred: bool,
    pub iteration_count: u32,
    pub pending_media: Option<MediaRef>,
    pub reaction: Option<ReactionContext>,
}

impl ConversationState {
    /// Start a turn on top of the persisted history
    pub fn resume(session_key: impl Into<String>, history: Vec<ConversationEntry>) -> Self {
        Self {
            session_key: session_key.into(),
            history,
            ..Default::default()
        }
    }

    /// Latest deliverable reply produced since the most recent user entry
    pub fn latest_reply(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .take_while(|entry| !matches!(entry, ConversationEntry::User { .. }))
            .find_map(ConversationEntry::reply_text)
    }

    /// History must be dropped after tool use, or when a tool request was
    /// left unanswered by the iteration cap.
    pub fn needs_compaction(&self) -> bool {
        self.tool_call_occurred
            || self
                .history
                .last()
                .is_some_and(ConversationEntry::requests_tools)
    }
}
