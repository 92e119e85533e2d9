//! HTTP Chat Bridge
//!
//! Talks to the chat bridge service that owns the group connections.
//! Sends are retried with exponential backoff; processing confirmations
//! are attempted once.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use siteline::{BatchItem, ChatBridge, DomainError};

const SIGNATURE_HEADER: &str = "X-Siteline-Signature";

/// Retry schedule for bridge sends
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `retry`-th failed attempt (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

pub struct HttpChatBridge {
    client: Client,
    base_url: String,
    signing_secret: Option<String>,
    retry: RetryPolicy,
}

impl HttpChatBridge {
    pub fn new(
        base_url: impl Into<String>,
        signing_secret: Option<String>,
        retry: RetryPolicy,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| DomainError::ExternalService(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signing_secret,
            retry,
        })
    }

    async fn post_once(&self, path: &str, body: &Value) -> Result<(), DomainError> {
        let bytes = serde_json::to_vec(body).map_err(|e| {
            DomainError::ExternalService(format!("Failed to serialize payload: {e}"))
        })?;

        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json");

        if let Some(secret) = &self.signing_secret {
            request = request.header(SIGNATURE_HEADER, sign_payload(secret, &bytes)?);
        }

        let response = request
            .body(bytes)
            .send()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Bridge {path}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if is_permanent(status) {
            Err(DomainError::Validation(format!(
                "Bridge {path} rejected request ({status}): {body}"
            )))
        } else {
            Err(DomainError::ExternalService(format!(
                "Bridge {path} returned {status}: {body}"
            )))
        }
    }

    async fn post_with_retry(&self, path: &str, body: Value) -> Result<(), DomainError> {
        let mut retry = 0;
        loop {
            match self.post_once(path, &body).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && retry + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(retry);
                    tracing::warn!(
                        "🔁 Bridge {} failed (attempt {}), retrying in {:?}: {}",
                        path,
                        retry + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Client errors other than timeouts and throttling are not worth retrying
fn is_permanent(status: StatusCode) -> bool {
    status.is_client_error()
        && status != StatusCode::REQUEST_TIMEOUT
        && status != StatusCode::TOO_MANY_REQUESTS
}

/// `sha256=<hex>` HMAC of the request body
fn sign_payload(secret: &str, payload: &[u8]) -> Result<String, DomainError> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DomainError::Validation(format!("Invalid signing secret: {e}")))?;
    mac.update(payload);

    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

fn batch_body(group_id: &str, items: &[BatchItem]) -> Value {
    json!({ "groupId": group_id, "messages": items })
}

#[async_trait]
impl ChatBridge for HttpChatBridge {
    async fn send_text(&self, group_id: &str, message: &str) -> Result<(), DomainError> {
        self.post_with_retry(
            "/send-message",
            json!({ "groupId": group_id, "message": message }),
        )
        .await
    }

    async fn send_batch(&self, group_id: &str, items: &[BatchItem]) -> Result<(), DomainError> {
        if items.is_empty() {
            return Ok(());
        }
        self.post_with_retry("/send-messages", batch_body(group_id, items))
            .await
    }

    async fn send_document(
        &self,
        group_id: &str,
        document_url: &str,
        filename: &str,
        caption: &str,
    ) -> Result<(), DomainError> {
        self.post_with_retry(
            "/send-document",
            json!({
                "groupId": group_id,
                "documentUrl": document_url,
                "filename": filename,
                "caption": caption,
            }),
        )
        .await
    }

    async fn schedule_reminder(
        &self,
        group_id: &str,
        name: &str,
        start: NaiveDateTime,
    ) -> Result<(), DomainError> {
        self.post_with_retry(
            "/schedule-message",
            json!({
                "groupId": group_id,
                "name": name,
                "startDate": start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            }),
        )
        .await
    }

    async fn acknowledge(&self, event_id: &str) -> Result<(), DomainError> {
        self.post_once("/confirm-processing", &json!({ "messageId": event_id }))
            .await
    }
}
