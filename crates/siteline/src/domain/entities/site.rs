//! Site - Tenant configuration
//!
//! A site is one construction project bound to one chat group. The
//! orchestration engine only ever reads the cached projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase value marking a soft-deleted site
pub const DISABLED_PHASE: &str = "Disabled";

/// Site vocabulary used to steer reasoning and transcription
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SiteContext {
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub suppliers: Vec<String>,
}

/// System-of-record site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    /// Chat group id; the tenant id
    pub group_id: String,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub training_phase: String,
    pub context: SiteContext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    pub fn is_disabled(&self) -> bool {
        self.training_phase == DISABLED_PHASE
    }
}

/// Denormalized projection kept in the site context cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedSite {
    pub id: i64,
    pub group_id: String,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub training_phase: String,
    pub context: SiteContext,
}

impl CachedSite {
    pub fn is_disabled(&self) -> bool {
        self.training_phase == DISABLED_PHASE
    }

    /// Name for display in reports and replies
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.group_id)
    }
}

impl From<Site> for CachedSite {
    fn from(site: Site) -> Self {
        Self {
            id: site.id,
            group_id: site.group_id,
            name: site.name,
            logo_url: site.logo_url,
            training_phase: site.training_phase,
            context: site.context,
        }
    }
}

/// Fields for registering a site
#[derive(Debug, Clone, Default)]
pub struct NewSite {
    pub group_id: String,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub training_phase: Option<String>,
    pub context: SiteContext,
}

/// Partial site update; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct SitePatch {
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub training_phase: Option<String>,
    pub context: Option<SiteContext>,
}

impl SitePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.logo_url.is_none()
            && self.training_phase.is_none()
            && self.context.is_none()
    }
}
