//! PDFMonkey report generation
//!
//! Creates a document generation from the report template and polls it
//! until a download URL is available.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use siteline::{DomainError, ReportGenerator, ReportRequest};

const PDFMONKEY_BASE: &str = "https://api.pdfmonkey.io/api/v1";
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_WAIT: Duration = Duration::from_secs(120);

pub struct PdfMonkeyReports {
    client: Client,
    api_key: String,
    template_id: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    document_generation: DocumentGeneration,
}

#[derive(Debug, Deserialize)]
struct DocumentGeneration {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    errors: Option<Value>,
}

impl PdfMonkeyReports {
    pub fn new(
        api_key: impl Into<String>,
        template_id: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DomainError::ExternalService(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            template_id: template_id.into(),
        })
    }

    async fn fetch(&self, doc_id: &str) -> Result<DocumentGeneration, DomainError> {
        let envelope: Envelope = self
            .client
            .get(format!("{PDFMONKEY_BASE}/document_generations/{doc_id}"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DomainError::ExternalService(format!("PDFMonkey poll failed: {e}")))?
            .json()
            .await
            .map_err(|e| DomainError::ExternalService(format!("PDFMonkey response: {e}")))?;
        Ok(envelope.document_generation)
    }

    async fn wait_for_download(&self, doc_id: &str) -> Result<String, DomainError> {
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            let document = self.fetch(doc_id).await?;
            tracing::debug!(doc_id, status = ?document.status, "PDFMonkey poll");

            match document.status.as_deref() {
                Some("success") => {
                    return document.download_url.ok_or_else(|| {
                        DomainError::ExternalService(format!(
                            "PDFMonkey document {doc_id} has no download URL"
                        ))
                    })
                }
                Some("error") | Some("failure") => {
                    let errors = document
                        .errors
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    return Err(DomainError::ExternalService(format!(
                        "PDFMonkey generation failed: {errors}"
                    )));
                }
                _ => continue,
            }
        }
    }
}

fn create_body(template_id: &str, request: &ReportRequest) -> Result<Value, DomainError> {
    // PDFMonkey expects the template payload as a JSON string
    let payload = serde_json::to_string(request)
        .map_err(|e| DomainError::Validation(format!("Unserializable report: {e}")))?;

    Ok(json!({
        "document_generation": {
            "document_template_id": template_id,
            "payload": payload,
            "status": "pending",
        }
    }))
}

#[async_trait]
impl ReportGenerator for PdfMonkeyReports {
    async fn generate(&self, request: &ReportRequest) -> Result<String, DomainError> {
        let envelope: Envelope = self
            .client
            .post(format!("{PDFMONKEY_BASE}/document_generations"))
            .bearer_auth(&self.api_key)
            .json(&create_body(&self.template_id, request)?)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DomainError::ExternalService(format!("PDFMonkey create failed: {e}")))?
            .json()
            .await
            .map_err(|e| DomainError::ExternalService(format!("PDFMonkey response: {e}")))?;

        let doc_id = envelope.document_generation.id;
        tracing::info!(doc_id = %doc_id, defects = request.defects.len(), "📄 PDF generation submitted");

        tokio::time::timeout(MAX_WAIT, self.wait_for_download(&doc_id))
            .await
            .map_err(|_| {
                DomainError::Timeout(format!(
                    "PDFMonkey document {doc_id} not ready after {MAX_WAIT:?}"
                ))
            })?
    }
}
