//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use crate::models::{
    CreateSiteRequest,
    HealthResponse,
    // Webhook models
    MessageBody,
    OriginalMessage,
    // Site models
    SiteContextBody,
    SiteResponse,
    UpdateSiteRequest,
    WebhookRequest,
    WebhookResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Webhook endpoints
        super::webhook::receive_event,
        // Admin endpoints
        super::admin::list_sites,
        super::admin::create_site,
        super::admin::get_site,
        super::admin::update_site,
        super::admin::disable_site,
    ),
    info(
        title = "Siteline API",
        version = "0.1.0",
        description = "Chat-driven construction defect assistant\n\nAdmits chat events from the bridge and manages the sites they belong to.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Webhook", description = "Webhook - Inbound chat events"),
        (name = "Admin", description = "Admin - Site management"),
    ),
    components(
        schemas(
            // Webhook
            WebhookRequest,
            MessageBody,
            OriginalMessage,
            WebhookResponse,
            // Site
            SiteContextBody,
            CreateSiteRequest,
            UpdateSiteRequest,
            SiteResponse,
            HealthResponse,
        )
    ),
)]
pub struct ApiDoc;
