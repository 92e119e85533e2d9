//! OpenAI chat-completions reasoning provider
//!
//! Maps the conversation history onto chat messages with function tools and
//! parses text and tool calls from the first choice.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use siteline::{
    ConversationEntry, DomainError, ReasoningProvider, ReasoningResponse, ToolDefinition,
    ToolInvocation,
};

pub struct OpenAiReasoner {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiReasoner {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| DomainError::ExternalService(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

fn to_openai_messages(instruction: &str, history: &[ConversationEntry]) -> Vec<Value> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(json!({ "role": "system", "content": instruction }));

    for entry in history {
        let message = match entry {
            ConversationEntry::User { content } => json!({ "role": "user", "content": content }),
            ConversationEntry::Assistant {
                content,
                tool_calls,
            } if tool_calls.is_empty() => {
                json!({ "role": "assistant", "content": content.clone().unwrap_or_default() })
            }
            ConversationEntry::Assistant {
                content,
                tool_calls,
            } => {
                let calls: Vec<Value> = tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            }
                        })
                    })
                    .collect();
                json!({ "role": "assistant", "content": content, "tool_calls": calls })
            }
            ConversationEntry::Tool {
                call_id,
                name,
                content,
            } => json!({
                "role": "tool",
                "tool_call_id": call_id,
                "name": name,
                "content": content,
            }),
        };
        messages.push(message);
    }

    messages
}

fn to_openai_tools(tools: &[ToolDefinition]) -> Value {
    Value::Array(
        tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect(),
    )
}

fn build_request_body(
    model: &str,
    instruction: &str,
    history: &[ConversationEntry],
    tools: &[ToolDefinition],
) -> Value {
    let mut body = json!({
        "model": model,
        "temperature": 0,
        "messages": to_openai_messages(instruction, history),
    });
    if !tools.is_empty() {
        body["tools"] = to_openai_tools(tools);
    }
    body
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

fn parse_response(raw: &str) -> Result<ReasoningResponse, DomainError> {
    let parsed: ChatCompletion = serde_json::from_str(raw)
        .map_err(|e| DomainError::ExternalService(format!("Invalid completion response: {e}")))?;
    let choice = parsed.choices.into_iter().next().ok_or_else(|| {
        DomainError::ExternalService("Completion response contained no choices".to_string())
    })?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .filter(|call| call.call_type == "function")
        .map(|call| ToolInvocation {
            id: call.id,
            name: call.function.name,
            // Malformed arguments are passed on as a string; the tool rejects them
            arguments: serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments)),
        })
        .collect();

    Ok(ReasoningResponse {
        content: choice.message.content,
        tool_calls,
    })
}

#[async_trait]
impl ReasoningProvider for OpenAiReasoner {
    async fn reason(
        &self,
        instruction: &str,
        history: &[ConversationEntry],
        tools: &[ToolDefinition],
    ) -> Result<ReasoningResponse, DomainError> {
        let body = build_request_body(&self.model, instruction, history, tools);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::ExternalService(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| DomainError::ExternalService(format!("OpenAI response read failed: {e}")))?;

        if !status.is_success() {
            return Err(DomainError::ExternalService(format!(
                "OpenAI returned {status}: {}",
                raw.chars().take(300).collect::<String>()
            )));
        }

        parse_response(&raw)
    }
}
