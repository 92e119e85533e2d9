//! Soniox speech-to-text
//!
//! Audio is uploaded to Soniox by the chat bridge; this adapter starts a
//! transcription for the file id, polls it, and fetches the transcript.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use siteline::{DomainError, Transcriber, TranscriptionContext};

const SONIOX_BASE: &str = "https://api.soniox.com/v1";
const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct SonioxTranscriber {
    client: Client,
    api_key: String,
    base_url: String,
    deadline: Duration,
}

#[derive(Debug, Deserialize)]
struct CreatedTranscription {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionStatus {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Transcript {
    #[serde(default)]
    text: String,
}

impl SonioxTranscriber {
    pub fn new(api_key: impl Into<String>, deadline: Duration) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DomainError::ExternalService(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: SONIOX_BASE.to_string(),
            deadline,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: String) -> Result<T, DomainError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DomainError::ExternalService(format!("Soniox: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Soniox response: {e}")))
    }

    async fn wait_until_completed(&self, job_id: &str) -> Result<(), DomainError> {
        let url = format!("{}/transcriptions/{}", self.base_url, job_id);
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            let status: TranscriptionStatus = self.get_json(url.clone()).await?;
            match status.status.as_str() {
                "completed" => return Ok(()),
                "error" | "failed" => {
                    return Err(DomainError::ExternalService(format!(
                        "Soniox transcription {} failed: {}",
                        job_id,
                        status.error_message.unwrap_or_default()
                    )))
                }
                _ => continue,
            }
        }
    }
}

fn create_body(file_id: &str, context: &TranscriptionContext) -> Value {
    let general: Vec<Value> = context
        .general
        .iter()
        .map(|(key, value)| json!({ "key": key, "value": value }))
        .collect();

    json!({
        "model": "stt-async-preview",
        "file_id": file_id,
        "language_hints": ["he", "en"],
        "context": {
            "general": general,
            "terms": context.terms,
        },
    })
}

#[async_trait]
impl Transcriber for SonioxTranscriber {
    async fn transcribe(
        &self,
        file_id: &str,
        context: &TranscriptionContext,
    ) -> Result<String, DomainError> {
        let created: CreatedTranscription = self
            .client
            .post(format!("{}/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&create_body(file_id, context))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DomainError::ExternalService(format!("Soniox: {e}")))?
            .json()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Soniox response: {e}")))?;

        tracing::info!(job_id = %created.id, "🎙️ Soniox transcription submitted");

        tokio::time::timeout(self.deadline, self.wait_until_completed(&created.id))
            .await
            .map_err(|_| {
                DomainError::Timeout(format!(
                    "Soniox transcription {} not completed after {:?}",
                    created.id, self.deadline
                ))
            })??;

        let transcript: Transcript = self
            .get_json(format!(
                "{}/transcriptions/{}/transcript",
                self.base_url, created.id
            ))
            .await?;

        tracing::info!(job_id = %created.id, length = transcript.text.len(), "🎙️ Transcript ready");
        Ok(transcript.text)
    }
}
