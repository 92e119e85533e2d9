//! Reasoning Provider Port
//!
//! Stateless request/response over the turn history plus a per-turn
//! instruction. The provider may answer with text, tool calls, or both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{errors::DomainError, ConversationEntry, ToolInvocation};

/// Tool advertised to the reasoning step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object
    pub parameters: serde_json::Value,
}

/// Response of one reasoning step
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReasoningResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

impl ReasoningResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// History entry recording this response
    pub fn into_entry(self) -> ConversationEntry {
        ConversationEntry::Assistant {
            content: self.content,
            tool_calls: self.tool_calls,
        }
    }
}

#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    async fn reason(
        &self,
        instruction: &str,
        history: &[ConversationEntry],
        tools: &[ToolDefinition],
    ) -> Result<ReasoningResponse, DomainError>;
}
