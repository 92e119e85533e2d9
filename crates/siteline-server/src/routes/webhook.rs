//! Webhook Route - Inbound chat events
//!
//! Authenticates, parses and admits one event; the turn itself runs later
//! in the worker pool.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use crate::application::{Admission, IntakeError};
use crate::auth::{header_value, WEBHOOK_SECRET_HEADER};
use crate::models::{WebhookRequest, WebhookResponse};
use crate::AppState;

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = match &self {
            IntakeError::Unauthenticated => StatusCode::UNAUTHORIZED,
            IntakeError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            IntakeError::InvalidEvent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            IntakeError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Receive one chat event
#[utoipa::path(
    post,
    path = "/webhook/agent",
    request_body = WebhookRequest,
    params(
        ("X-Webhook-Secret" = String, Header, description = "Shared webhook secret")
    ),
    responses(
        (status = 200, description = "Accepted, or ignored as a duplicate", body = WebhookResponse),
        (status = 401, description = "Missing or invalid secret"),
        (status = 413, description = "Body too large"),
        (status = 422, description = "Malformed event"),
        (status = 429, description = "Tenant rate limit exceeded"),
        (status = 503, description = "Queue unavailable, retry later")
    ),
    tag = "Webhook"
)]
pub async fn receive_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<WebhookRequest>, JsonRejection>,
) -> Response {
    let secret = header_value(&headers, WEBHOOK_SECRET_HEADER);
    if let Err(e) = state.intake.authenticate(secret) {
        return e.into_response();
    }

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("Rejected webhook body: {}", rejection.body_text());
            return rejection.into_response();
        }
    };

    let event = match request.into_event() {
        Ok(event) => event,
        Err(reason) => return IntakeError::InvalidEvent(reason).into_response(),
    };

    match state.intake.admit(secret, event).await {
        Ok(Admission::Accepted { job_id }) => Json(WebhookResponse {
            status: "accepted".to_string(),
            job_id: Some(job_id.to_string()),
        })
        .into_response(),
        Ok(Admission::Duplicate) => Json(WebhookResponse {
            status: "duplicate".to_string(),
            job_id: None,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create webhook router
pub fn router() -> Router<AppState> {
    Router::new().route("/webhook/agent", post(receive_event))
}
