//! Defect logging tools

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use siteline::{
    batch_rows, format_defect_row, BatchItem, ChatBridge, DefectPatch, DefectRepository,
    DefectStatus, DomainError, NewDefect, REPORT_BATCH_SIZE,
};

use super::{non_empty, parse_args, Tool, ToolContext, ToolOutput};

#[derive(Debug, Deserialize)]
struct AddDefectArgs {
    description: String,
    #[serde(default)]
    supplier: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, alias = "image_url")]
    image: Option<String>,
}

/// Log a new defect, confirm it, then resend the site's full defect list
pub struct AddDefectTool {
    defects: Arc<dyn DefectRepository>,
    bridge: Arc<dyn ChatBridge>,
    max_description_length: usize,
}

impl AddDefectTool {
    pub fn new(
        defects: Arc<dyn DefectRepository>,
        bridge: Arc<dyn ChatBridge>,
        max_description_length: usize,
    ) -> Self {
        Self {
            defects,
            bridge,
            max_description_length,
        }
    }
}

#[async_trait]
impl Tool for AddDefectTool {
    fn name(&self) -> &str {
        "add_defect"
    }

    fn description(&self) -> &str {
        "Log a new construction defect for this site. Use when a user reports a problem, \
         damage or unfinished work. The defect number is assigned automatically."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "description": {
                    "type": "string",
                    "description": "What is wrong, in the user's words"
                },
                "supplier": {
                    "type": "string",
                    "description": "Responsible supplier or subcontractor, from the site's supplier list when possible"
                },
                "location": {
                    "type": "string",
                    "description": "Where on site, from the site's location list when possible"
                },
                "image": {
                    "type": "string",
                    "description": "Photo URL of the defect, when the user attached one"
                }
            },
            "required": ["description"]
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, DomainError> {
        let args: AddDefectArgs = parse_args(self.name(), input)?;

        let description = args.description.trim().to_string();
        if description.is_empty() {
            return Ok(ToolOutput::error("Error: description is required."));
        }
        if description.chars().count() > self.max_description_length {
            return Ok(ToolOutput::error(format!(
                "Error: description is longer than {} characters.",
                self.max_description_length
            )));
        }

        let new_defect = NewDefect {
            description,
            reporter: ctx.sender_id.clone(),
            supplier: non_empty(args.supplier),
            location: non_empty(args.location),
            image_url: non_empty(args.image).or_else(|| ctx.image_url.clone()),
        };

        let defect = self.defects.create_next(ctx.site.id, new_defect).await?;
        tracing::info!(tenant = %ctx.group_id(), defect_id = defect.defect_id, "📝 Defect added");

        let confirmation = format!("*ליקוי התווסף בהצלחה*\n{}", format_defect_row(&defect));
        self.bridge.send_text(ctx.group_id(), &confirmation).await?;

        let all = self.defects.list_by_site(ctx.site.id).await?;
        let items: Vec<BatchItem> = batch_rows(&all, REPORT_BATCH_SIZE)
            .into_iter()
            .map(|consolidated_info| BatchItem { consolidated_info })
            .collect();
        if !items.is_empty() {
            self.bridge.send_batch(ctx.group_id(), &items).await?;
        }

        Ok(ToolOutput::ok(format!(
            "Defect #{} added successfully.",
            defect.defect_id
        )))
    }
}

#[derive(Debug, Deserialize)]
struct UpdateDefectArgs {
    defect_id: i32,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    supplier: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, alias = "image_url")]
    image: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Change fields of an existing defect; empty arguments leave fields untouched
pub struct UpdateDefectTool {
    defects: Arc<dyn DefectRepository>,
    bridge: Arc<dyn ChatBridge>,
}

impl UpdateDefectTool {
    pub fn new(defects: Arc<dyn DefectRepository>, bridge: Arc<dyn ChatBridge>) -> Self {
        Self { defects, bridge }
    }
}

#[async_trait]
impl Tool for UpdateDefectTool {
    fn name(&self) -> &str {
        "update_defect"
    }

    fn description(&self) -> &str {
        "Update an existing defect by its number: change status (פתוח, בעבודה, סגור), \
         description, supplier, location or image. Only provided fields change."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "defect_id": {
                    "type": "integer",
                    "description": "Defect number as shown in the list, without '#'"
                },
                "description": { "type": "string" },
                "supplier": { "type": "string" },
                "location": { "type": "string" },
                "image": { "type": "string" },
                "status": {
                    "type": "string",
                    "enum": ["פתוח", "בעבודה", "סגור"]
                }
            },
            "required": ["defect_id"]
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, DomainError> {
        let args: UpdateDefectArgs = parse_args(self.name(), input)?;

        let status = non_empty(args.status)
            .map(|s| s.parse::<DefectStatus>().map_err(DomainError::Validation))
            .transpose()?;
        let patch = DefectPatch {
            description: non_empty(args.description),
            supplier: non_empty(args.supplier),
            location: non_empty(args.location),
            image_url: non_empty(args.image),
            status,
        };
        if patch.is_empty() {
            return Ok(ToolOutput::error("Error: no fields to update."));
        }

        let Some(defect) = self
            .defects
            .update(ctx.site.id, args.defect_id, patch)
            .await?
        else {
            return Ok(ToolOutput::error(format!(
                "Error: defect #{} not found.",
                args.defect_id
            )));
        };

        tracing::info!(tenant = %ctx.group_id(), defect_id = defect.defect_id, "📝 Defect updated");
        let confirmation = format!("ליקוי עודכן בהצלחה\n{}", format_defect_row(&defect));
        self.bridge.send_text(ctx.group_id(), &confirmation).await?;

        Ok(ToolOutput::ok(format!("Defect #{} updated.", defect.defect_id)))
    }
}
