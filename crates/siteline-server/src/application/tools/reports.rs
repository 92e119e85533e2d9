//! Defect report tools

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use siteline::{
    batch_rows, BatchItem, ChatBridge, Defect, DefectFilter, DefectRepository, DomainError,
    ReportGenerator, ReportRequest, ReportRow, REPORT_BATCH_SIZE,
};

use super::{parse_args, Tool, ToolContext, ToolOutput};

#[derive(Debug, Default, Deserialize)]
struct ReportArgs {
    #[serde(default)]
    status_filter: Option<String>,
    #[serde(default)]
    description_filter: Option<String>,
    #[serde(default)]
    supplier_filter: Option<String>,
    #[serde(default)]
    defect_id_filter: Option<String>,
}

impl ReportArgs {
    fn filter(&self) -> Result<DefectFilter, DomainError> {
        DefectFilter::from_args(
            self.status_filter.as_deref(),
            self.description_filter.as_deref(),
            self.supplier_filter.as_deref(),
            self.defect_id_filter.as_deref(),
        )
    }
}

fn filter_properties(with_ids: bool) -> serde_json::Value {
    let mut properties = json!({
        "status_filter": {
            "type": "string",
            "description": "פתוח, בעבודה or סגור; empty for any"
        },
        "description_filter": {
            "type": "string",
            "description": "Free text searched in descriptions; empty for any"
        },
        "supplier_filter": {
            "type": "string",
            "description": "Exact supplier name; empty for any"
        }
    });
    if with_ids {
        properties["defect_id_filter"] = json!({
            "type": "string",
            "description": "Range like \"77-90\" or list like \"77,78,79\"; empty for any"
        });
    }
    properties
}

async fn filtered_defects(
    defects: &dyn DefectRepository,
    site_id: i64,
    filter: &DefectFilter,
) -> Result<Vec<Defect>, DomainError> {
    let all = defects.list_by_site(site_id).await?;
    Ok(filter.apply(all))
}

/// Send the matching defects as chat messages, 20 rows per message
pub struct SendWhatsappReportTool {
    defects: Arc<dyn DefectRepository>,
    bridge: Arc<dyn ChatBridge>,
}

impl SendWhatsappReportTool {
    pub fn new(defects: Arc<dyn DefectRepository>, bridge: Arc<dyn ChatBridge>) -> Self {
        Self { defects, bridge }
    }
}

#[async_trait]
impl Tool for SendWhatsappReportTool {
    fn name(&self) -> &str {
        "send_whatsapp_report"
    }

    fn description(&self) -> &str {
        "Send the site's defect list to the group as chat messages, optionally filtered \
         by status, description text, supplier or defect numbers."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": filter_properties(true)
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, DomainError> {
        let args: ReportArgs = parse_args(self.name(), input)?;
        let filter = args.filter()?;
        let matched = filtered_defects(self.defects.as_ref(), ctx.site.id, &filter).await?;

        if matched.is_empty() {
            self.bridge
                .send_text(ctx.group_id(), "לא נמצאו ליקויים התואמים לחיפוש.")
                .await?;
            return Ok(ToolOutput::ok("No defects matched."));
        }

        let items: Vec<BatchItem> = batch_rows(&matched, REPORT_BATCH_SIZE)
            .into_iter()
            .map(|consolidated_info| BatchItem { consolidated_info })
            .collect();
        self.bridge.send_batch(ctx.group_id(), &items).await?;

        Ok(ToolOutput::ok(format!("Sent {} defects.", matched.len())))
    }
}

/// Render the matching defects into a PDF and send it as a document
pub struct SendPdfReportTool {
    defects: Arc<dyn DefectRepository>,
    bridge: Arc<dyn ChatBridge>,
    generator: Option<Arc<dyn ReportGenerator>>,
}

impl SendPdfReportTool {
    pub fn new(
        defects: Arc<dyn DefectRepository>,
        bridge: Arc<dyn ChatBridge>,
        generator: Option<Arc<dyn ReportGenerator>>,
    ) -> Self {
        Self {
            defects,
            bridge,
            generator,
        }
    }
}

#[async_trait]
impl Tool for SendPdfReportTool {
    fn name(&self) -> &str {
        "send_pdf_report"
    }

    fn description(&self) -> &str {
        "Generate a PDF defect report for the site and send it to the group, optionally \
         filtered by status, description text or supplier."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": filter_properties(false)
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, DomainError> {
        let Some(generator) = &self.generator else {
            return Ok(ToolOutput::error("Error: PDF reports are not configured."));
        };

        let mut args: ReportArgs = parse_args(self.name(), input)?;
        args.defect_id_filter = None;
        let filter = args.filter()?;
        let matched = filtered_defects(self.defects.as_ref(), ctx.site.id, &filter).await?;

        if matched.is_empty() {
            self.bridge
                .send_text(ctx.group_id(), "לא נמצאו ליקויים לדוח.")
                .await?;
            return Ok(ToolOutput::ok("No defects matched."));
        }

        let site_name = ctx.site.display_name().to_string();
        let request = ReportRequest {
            site_name: site_name.clone(),
            logo_url: ctx.site.logo_url.clone(),
            defects: matched.iter().map(ReportRow::from).collect(),
        };

        let url = match generator.generate(&request).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(tenant = %ctx.group_id(), "Report generation failed: {}", e);
                return Ok(ToolOutput::error(format!("שגיאה ביצירת הדוח: {e}")));
            }
        };

        self.bridge
            .send_document(
                ctx.group_id(),
                &url,
                &format!("report_{site_name}.pdf"),
                &format!("דוח ליקויים: {} ליקויים", matched.len()),
            )
            .await?;

        tracing::info!(tenant = %ctx.group_id(), count = matched.len(), "📄 PDF report sent");
        Ok(ToolOutput::ok(format!("PDF sent with {} defects.", matched.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        tool_context, BridgeCall, FakeReportGenerator, MemoryDefectRepository, RecordingBridge,
    };
    use siteline::NewDefect;

    async fn seeded(count: usize) -> Arc<MemoryDefectRepository> {
        let defects = Arc::new(MemoryDefectRepository::default());
        let site_id = tool_context("T1").site.id;
        for i in 0..count {
            defects
                .create_next(
                    site_id,
                    NewDefect {
                        description: format!("defect {i}"),
                        reporter: "972500000001".to_string(),
                        supplier: Some(if i % 2 == 0 { "Acme" } else { "Other" }.to_string()),
                        location: None,
                        image_url: None,
                    },
                )
                .await
                .unwrap();
        }
        defects
    }

    #[tokio::test]
    async fn test_whatsapp_report_batches_matches() {
        let defects = seeded(45).await;
        let bridge = Arc::new(RecordingBridge::default());
        let tool = SendWhatsappReportTool::new(defects, bridge.clone());

        let output = tool.invoke(&tool_context("T1"), json!({})).await.unwrap();
        assert_eq!(output.content, "Sent 45 defects.");
        match &bridge.calls()[0] {
            BridgeCall::Batch { items, .. } => assert_eq!(items.len(), 3),
            other => panic!("expected batch, got {other:?}"),
        }

        let output = tool
            .invoke(
                &tool_context("T1"),
                json!({"supplier_filter": "Acme", "defect_id_filter": "1-4"}),
            )
            .await
            .unwrap();
        assert_eq!(output.content, "Sent 2 defects.");
    }

    #[tokio::test]
    async fn test_whatsapp_report_without_matches_notifies_group() {
        let defects = seeded(2).await;
        let bridge = Arc::new(RecordingBridge::default());
        let tool = SendWhatsappReportTool::new(defects, bridge.clone());

        let output = tool
            .invoke(&tool_context("T1"), json!({"status_filter": "סגור"}))
            .await
            .unwrap();
        assert_eq!(output.content, "No defects matched.");
        assert_eq!(bridge.texts(), vec!["לא נמצאו ליקויים התואמים לחיפוש.".to_string()]);
    }

    #[tokio::test]
    async fn test_pdf_report_sends_document() {
        let defects = seeded(3).await;
        let bridge = Arc::new(RecordingBridge::default());
        let generator = Arc::new(FakeReportGenerator::default());
        let dyn_generator: Arc<dyn ReportGenerator> = generator.clone();
        let tool = SendPdfReportTool::new(defects, bridge.clone(), Some(dyn_generator));

        let output = tool.invoke(&tool_context("T1"), json!({})).await.unwrap();
        assert_eq!(output.content, "PDF sent with 3 defects.");
        assert_eq!(generator.requests()[0].site_name, "Tower T1");

        match &bridge.calls()[0] {
            BridgeCall::Document {
                filename, caption, ..
            } => {
                assert_eq!(filename, "report_Tower T1.pdf");
                assert_eq!(caption, "דוח ליקויים: 3 ליקויים");
            }
            other => panic!("expected document, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pdf_report_failure_is_reported() {
        let defects = seeded(1).await;
        let bridge = Arc::new(RecordingBridge::default());
        let generator: Arc<dyn ReportGenerator> = Arc::new(FakeReportGenerator::failing());
        let tool = SendPdfReportTool::new(defects, bridge.clone(), Some(generator));

        let output = tool.invoke(&tool_context("T1"), json!({})).await.unwrap();
        assert!(output.is_error);
        assert!(output.content.starts_with("שגיאה ביצירת הדוח:"));
        assert!(bridge.calls().is_empty());

        let unconfigured = SendPdfReportTool::new(seeded(1).await, bridge, None);
        let output = unconfigured.invoke(&tool_context("T1"), json!({})).await.unwrap();
        assert!(output.is_error);
    }
}
