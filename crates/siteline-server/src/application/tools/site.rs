//! Scheduling and site settings tools

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;

use siteline::{ChatBridge, DomainError};

use super::{parse_args, Tool, ToolContext, ToolOutput};
use crate::application::SiteService;

const WALL_CLOCK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Accepts `2026-02-19T18:00:00`, `2026-02-19T18:00` or a full RFC 3339 stamp
fn parse_event_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, WALL_CLOCK_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

#[derive(Debug, Deserialize)]
struct AddEventArgs {
    description: String,
    time: String,
}

/// Schedule a reminder message in the group
pub struct AddEventTool {
    bridge: Arc<dyn ChatBridge>,
}

impl AddEventTool {
    pub fn new(bridge: Arc<dyn ChatBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for AddEventTool {
    fn name(&self) -> &str {
        "add_event"
    }

    fn description(&self) -> &str {
        "Schedule a reminder or event message for the group at a given local time."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "description": {
                    "type": "string",
                    "description": "Event details in Hebrew"
                },
                "time": {
                    "type": "string",
                    "description": "ISO 8601 local datetime, e.g. 2026-02-19T18:00:00"
                }
            },
            "required": ["description", "time"]
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, DomainError> {
        let args: AddEventArgs = parse_args(self.name(), input)?;

        let Some(start) = parse_event_time(&args.time) else {
            return Ok(ToolOutput::error(format!(
                "Error: invalid time '{}', expected ISO 8601 like 2026-02-19T18:00:00.",
                args.time
            )));
        };

        self.bridge
            .schedule_reminder(ctx.group_id(), &args.description, start)
            .await?;

        let when = start.format(WALL_CLOCK_FORMAT);
        tracing::info!(tenant = %ctx.group_id(), "⏰ Event scheduled for {}", when);
        Ok(ToolOutput::ok(format!(
            "Event '{}' scheduled for {}.",
            args.description, when
        )))
    }
}

#[derive(Debug, Deserialize)]
struct UpdateLogoArgs {
    image_url: String,
}

/// Replace the logo used on PDF reports
pub struct UpdateLogoTool {
    sites: Arc<SiteService>,
}

impl UpdateLogoTool {
    pub fn new(sites: Arc<SiteService>) -> Self {
        Self { sites }
    }
}

#[async_trait]
impl Tool for UpdateLogoTool {
    fn name(&self) -> &str {
        "update_logo"
    }

    fn description(&self) -> &str {
        "Update the site logo used in PDF reports. Only when the user uploaded an image \
         and explicitly asked to use it as the logo."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "image_url": {
                    "type": "string",
                    "description": "URL of the uploaded image"
                }
            },
            "required": ["image_url"]
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, DomainError> {
        let args: UpdateLogoArgs = parse_args(self.name(), input)?;
        let url = args.image_url.trim();
        if url.is_empty() {
            return Ok(ToolOutput::error("Error: image_url is required."));
        }

        match self.sites.update_logo(ctx.group_id(), url).await? {
            Some(_) => Ok(ToolOutput::ok("Logo updated.")),
            None => Ok(ToolOutput::error("Error: site not found.")),
        }
    }
}
