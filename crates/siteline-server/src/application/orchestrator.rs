//! Orchestration Engine
//!
//! Runs one conversational turn per admitted event: site lookup,
//! transcription, a bounded reason/act loop over the tool registry, reply
//! delivery and history compaction. Every processed event is acknowledged
//! to the bridge exactly once, whatever the turn's outcome.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::json;
use tokio::sync::Mutex;

use siteline::{
    CachedSite, ChatBridge, ConversationEntry, ConversationRepository, ConversationState,
    DomainError, IncomingEvent, ReasoningProvider, ToolInvocation, Transcriber,
    TranscriptionContext,
};

use super::prompt::build_instruction;
use super::tools::{ToolContext, ToolRegistry};
use super::SiteContextCache;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Reasoning calls allowed per turn
    pub max_iterations: u32,
    pub transcription_timeout: Duration,
    /// Upper bound on a whole turn, acknowledgment excluded
    pub turn_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            transcription_timeout: Duration::from_secs(60),
            turn_timeout: Duration::from_secs(300),
        }
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Unknown or disabled tenant; nothing was sent or stored
    Skipped,
    Completed {
        iterations: u32,
        used_tools: bool,
        replied: bool,
    },
}

/// Loop state after the linear prefix of a turn
#[derive(Debug)]
enum Step {
    Reason,
    ExecuteTools(Vec<ToolInvocation>),
    Finalize,
}

pub struct Orchestrator {
    sites: Arc<SiteContextCache>,
    reasoner: Arc<dyn ReasoningProvider>,
    transcriber: Option<Arc<dyn Transcriber>>,
    tools: Arc<ToolRegistry>,
    bridge: Arc<dyn ChatBridge>,
    conversations: Arc<dyn ConversationRepository>,
    settings: EngineSettings,
    /// One lock per live session key. Exclusivity holds within this process
    /// only; running several worker processes needs a shared lock on the key.
    sessions: DashMap<String, Arc<Mutex<()>>>,
}

impl Orchestrator {
    pub fn new(
        sites: Arc<SiteContextCache>,
        reasoner: Arc<dyn ReasoningProvider>,
        transcriber: Option<Arc<dyn Transcriber>>,
        tools: Arc<ToolRegistry>,
        bridge: Arc<dyn ChatBridge>,
        conversations: Arc<dyn ConversationRepository>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            sites,
            reasoner,
            transcriber,
            tools,
            bridge,
            conversations,
            settings,
            sessions: DashMap::new(),
        }
    }

    /// Run the turn under the turn deadline, then acknowledge the event
    pub async fn process(&self, event: &IncomingEvent) -> Result<TurnOutcome, DomainError> {
        let result =
            match tokio::time::timeout(self.settings.turn_timeout, self.run_turn(event)).await {
                Ok(result) => result,
                Err(_) => Err(DomainError::Timeout(format!(
                    "turn for event {} exceeded {:?}",
                    event.event_id, self.settings.turn_timeout
                ))),
            };

        if let Err(e) = self.bridge.acknowledge(&event.event_id).await {
            tracing::warn!(event_id = %event.event_id, "Acknowledgment failed: {}", e);
        }

        result
    }

    fn session_lock(&self, session_key: &str) -> Arc<Mutex<()>> {
        self.sessions
            .entry(session_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the session's lock entry once no other turn holds or awaits it
    fn release_session(&self, session_key: &str) {
        self.sessions
            .remove_if(session_key, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub async fn run_turn(&self, event: &IncomingEvent) -> Result<TurnOutcome, DomainError> {
        let Some(site) = self.sites.get(&event.tenant_id).await? else {
            tracing::info!(tenant = %event.tenant_id, event_id = %event.event_id, "No site for tenant, skipping");
            return Ok(TurnOutcome::Skipped);
        };
        if site.is_disabled() {
            tracing::info!(tenant = %event.tenant_id, event_id = %event.event_id, "Site disabled, skipping");
            return Ok(TurnOutcome::Skipped);
        }

        let session_key = event.session_key();
        let lock = self.session_lock(&session_key);
        let outcome = {
            let _guard = lock.lock().await;
            self.run_locked_turn(event, &site, session_key.clone()).await
        };
        drop(lock);
        self.release_session(&session_key);
        outcome
    }

    async fn run_locked_turn(
        &self,
        event: &IncomingEvent,
        site: &CachedSite,
        session_key: String,
    ) -> Result<TurnOutcome, DomainError> {
        let history = self.conversations.load(&session_key).await?;
        let mut state = ConversationState::resume(session_key, history);
        state.pending_media = event.media.clone();
        state.reaction = event.reaction_context();

        let transcript = self.transcribe(event, site).await;
        let input = build_input(event, transcript.as_deref(), &state);
        state.history.push(ConversationEntry::user(input));

        let result = self.reason_and_reply(event, site, &mut state).await;

        // Compaction also runs when the turn failed after a tool call
        let persisted = if state.needs_compaction() {
            self.conversations.clear(&state.session_key).await
        } else if result.is_ok() {
            self.conversations
                .save(&state.session_key, &state.history)
                .await
        } else {
            Ok(())
        };

        let replied = match result {
            Ok(replied) => {
                persisted?;
                replied
            }
            Err(e) => {
                if let Err(persist_err) = persisted {
                    tracing::warn!(
                        session = %state.session_key,
                        "History compaction failed after turn error: {}",
                        persist_err
                    );
                }
                return Err(e);
            }
        };

        Ok(TurnOutcome::Completed {
            iterations: state.iteration_count,
            used_tools: state.tool_call_occurred,
            replied,
        })
    }

    /// Reason/act loop followed by reply delivery
    async fn reason_and_reply(
        &self,
        event: &IncomingEvent,
        site: &CachedSite,
        state: &mut ConversationState,
    ) -> Result<bool, DomainError> {
        let instruction = build_instruction(site, chrono::Local::now().naive_local());
        let definitions = self.tools.definitions();
        let ctx = ToolContext {
            site: site.clone(),
            sender_id: event.sender_id.clone(),
            image_url: event.image_url().map(str::to_string),
        };

        let mut step = Step::Reason;
        loop {
            step = match step {
                Step::Reason => {
                    let response = self
                        .reasoner
                        .reason(&instruction, &state.history, &definitions)
                        .await?;
                    state.iteration_count += 1;

                    let calls = response.tool_calls.clone();
                    state.history.push(response.into_entry());

                    if calls.is_empty() {
                        Step::Finalize
                    } else if state.iteration_count >= self.settings.max_iterations {
                        tracing::warn!(
                            tenant = %event.tenant_id,
                            "Reached max iterations ({}) with tools still requested",
                            self.settings.max_iterations
                        );
                        Step::Finalize
                    } else {
                        Step::ExecuteTools(calls)
                    }
                }
                Step::ExecuteTools(calls) => {
                    for call in &calls {
                        let output = self.tools.dispatch(&ctx, call).await;
                        state.history.push(ConversationEntry::Tool {
                            call_id: call.id.clone(),
                            name: call.name.clone(),
                            content: output.content,
                        });
                    }
                    state.tool_call_occurred = true;
                    Step::Reason
                }
                Step::Finalize => break,
            };
        }

        tracing::info!(
            tenant = %event.tenant_id,
            event_id = %event.event_id,
            iterations = state.iteration_count,
            used_tools = state.tool_call_occurred,
            "🤖 Turn finished"
        );

        self.deliver(site, state).await
    }

    async fn transcribe(&self, event: &IncomingEvent, site: &CachedSite) -> Option<String> {
        let file_id = event.transcription_file_id()?;
        let Some(transcriber) = &self.transcriber else {
            tracing::warn!(tenant = %event.tenant_id, "Audio received but no transcriber configured");
            return None;
        };

        let context = TranscriptionContext::for_site(&site.context);
        match tokio::time::timeout(
            self.settings.transcription_timeout,
            transcriber.transcribe(file_id, &context),
        )
        .await
        {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                tracing::warn!(tenant = %event.tenant_id, "Transcription failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!(tenant = %event.tenant_id, "Transcription timed out");
                None
            }
        }
    }

    /// Send the turn's reply, if it produced one. A bridge failure fails the turn.
    async fn deliver(
        &self,
        site: &CachedSite,
        state: &ConversationState,
    ) -> Result<bool, DomainError> {
        let Some(reply) = state.latest_reply() else {
            return Ok(false);
        };

        self.bridge
            .send_text(&site.group_id, reply)
            .await
            .map_err(|e| {
                tracing::error!(tenant = %site.group_id, "Reply delivery failed: {}", e);
                e
            })?;
        Ok(true)
    }
}

/// JSON user turn handed to the reasoning step
fn build_input(event: &IncomingEvent, transcript: Option<&str>, state: &ConversationState) -> String {
    let message = event
        .text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or(transcript)
        .unwrap_or_default();

    let mut input = json!({ "message": message });
    if let Some(url) = event.image_url() {
        input["image"] = json!(url);
    }
    if let Some(reaction) = &state.reaction {
        input["reaction"] = json!(reaction.emoji);
        input["originalMessage"] = json!(reaction.replied_to_text);
    }
    input.to_string()
}
