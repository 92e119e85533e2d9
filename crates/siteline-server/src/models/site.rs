//! Site DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use siteline::{NewSite, Site, SiteContext, SitePatch};

/// Site vocabulary
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SiteContextBody {
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub suppliers: Vec<String>,
}

impl From<SiteContextBody> for SiteContext {
    fn from(body: SiteContextBody) -> Self {
        Self {
            locations: body.locations,
            suppliers: body.suppliers,
        }
    }
}

impl From<SiteContext> for SiteContextBody {
    fn from(context: SiteContext) -> Self {
        Self {
            locations: context.locations,
            suppliers: context.suppliers,
        }
    }
}

/// Request to register a site
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSiteRequest {
    /// Chat group id the site is bound to
    pub group_id: String,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    /// Defaults to "Active"
    pub training_phase: Option<String>,
    #[serde(default)]
    pub context: SiteContextBody,
}

impl From<CreateSiteRequest> for NewSite {
    fn from(req: CreateSiteRequest) -> Self {
        Self {
            group_id: req.group_id.trim().to_string(),
            name: req.name,
            logo_url: req.logo_url,
            training_phase: req.training_phase,
            context: req.context.into(),
        }
    }
}

/// Partial site update; omitted fields are left unchanged
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSiteRequest {
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub training_phase: Option<String>,
    pub context: Option<SiteContextBody>,
}

impl From<UpdateSiteRequest> for SitePatch {
    fn from(req: UpdateSiteRequest) -> Self {
        Self {
            name: req.name,
            logo_url: req.logo_url,
            training_phase: req.training_phase,
            context: req.context.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SiteResponse {
    pub id: i64,
    pub group_id: String,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub training_phase: String,
    pub context: SiteContextBody,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Site> for SiteResponse {
    fn from(site: Site) -> Self {
        Self {
            id: site.id,
            group_id: site.group_id,
            name: site.name,
            logo_url: site.logo_url,
            training_phase: site.training_phase,
            context: site.context.into(),
            created_at: site.created_at,
            updated_at: site.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
