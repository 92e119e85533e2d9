//! Shared-secret authentication
//!
//! Inbound webhooks carry `X-Webhook-Secret`; admin routes carry
//! `X-Admin-Key`. Both are compared in constant time.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Constant-time byte comparison; only the length difference leaks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Whether a presented secret matches the configured one
pub fn secret_matches(expected: &str, presented: Option<&str>) -> bool {
    match presented {
        Some(value) if !expected.is_empty() => {
            constant_time_eq(value.as_bytes(), expected.as_bytes())
        }
        _ => false,
    }
}

pub fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

/// Configured admin key; `None` locks the admin routes
#[derive(Clone)]
pub struct AdminKey(pub Option<Arc<str>>);

/// Admin authentication middleware
pub async fn admin_auth_middleware(
    State(AdminKey(expected)): State<AdminKey>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = expected else {
        tracing::warn!("Admin request rejected: no ADMIN_API_KEY configured");
        return Err(StatusCode::UNAUTHORIZED);
    };

    if secret_matches(&expected, header_value(request.headers(), ADMIN_KEY_HEADER)) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Invalid admin key attempted");
        Err(StatusCode::UNAUTHORIZED)
    }
}
