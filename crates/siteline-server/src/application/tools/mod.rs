//! Tool registry
//!
//! The fixed set of actions the reasoning step may request. Tenant and
//! sender come from the [`ToolContext`], never from model-supplied
//! arguments.

mod defects;
mod reports;
mod site;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use siteline::{
    CachedSite, ChatBridge, DefectRepository, DomainError, ReportGenerator, ToolDefinition,
    ToolInvocation,
};

pub use defects::{AddDefectTool, UpdateDefectTool};
pub use reports::{SendPdfReportTool, SendWhatsappReportTool};
pub use site::{AddEventTool, UpdateLogoTool};

use super::SiteService;

/// Output of a tool call, fed back to the reasoning step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Per-turn facts injected into every tool call
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub site: CachedSite,
    pub sender_id: String,
    /// Image attached to the triggering event
    pub image_url: Option<String>,
}

impl ToolContext {
    pub fn group_id(&self) -> &str {
        &self.site.group_id
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object
    fn parameters_schema(&self) -> serde_json::Value;

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, DomainError>;
}

/// Decode tool arguments into their typed form
pub(crate) fn parse_args<T: DeserializeOwned>(
    tool: &str,
    input: serde_json::Value,
) -> Result<T, DomainError> {
    serde_json::from_value(input)
        .map_err(|e| DomainError::Validation(format!("Invalid arguments for {tool}: {e}")))
}

/// Treat empty strings from the model as absent
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Collaborators the standard tool set is built from
#[derive(Clone)]
pub struct ToolDeps {
    pub defects: Arc<dyn DefectRepository>,
    pub bridge: Arc<dyn ChatBridge>,
    pub sites: Arc<SiteService>,
    pub reports: Option<Arc<dyn ReportGenerator>>,
    pub max_description_length: usize,
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// The site assistant's tool set
    pub fn standard(deps: ToolDeps) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AddDefectTool::new(
            deps.defects.clone(),
            deps.bridge.clone(),
            deps.max_description_length,
        )));
        registry.register(Arc::new(UpdateDefectTool::new(
            deps.defects.clone(),
            deps.bridge.clone(),
        )));
        registry.register(Arc::new(SendWhatsappReportTool::new(
            deps.defects.clone(),
            deps.bridge.clone(),
        )));
        registry.register(Arc::new(SendPdfReportTool::new(
            deps.defects,
            deps.bridge.clone(),
            deps.reports,
        )));
        registry.register(Arc::new(AddEventTool::new(deps.bridge)));
        registry.register(Arc::new(UpdateLogoTool::new(deps.sites)));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Definitions advertised to the reasoning step, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Run one requested call.
    ///
    /// Unknown names and tool failures become error outputs for this call;
    /// they never abort the turn.
    pub async fn dispatch(&self, ctx: &ToolContext, call: &ToolInvocation) -> ToolOutput {
        let Some(tool) = self.get(&call.name) else {
            let err = DomainError::UnknownTool(call.name.clone());
            tracing::warn!(tool = %call.name, "Reasoning step requested an unregistered tool");
            return ToolOutput::error(err.to_string());
        };

        match tool.invoke(ctx, call.arguments.clone()).await {
            Ok(output) => {
                tracing::info!(tool = %call.name, tenant = %ctx.group_id(), is_error = output.is_error, "🔧 Tool executed");
                output
            }
            Err(e) => {
                tracing::warn!(tool = %call.name, tenant = %ctx.group_id(), "Tool failed: {}", e);
                ToolOutput::error(format!("Error: {e}"))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
