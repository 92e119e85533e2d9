//! Admin Routes - Site management
//!
//! All routes require `X-Admin-Key`. Every write goes through
//! `SiteService`, which invalidates the site cache before returning.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};

use siteline::DomainError;

use crate::auth::{admin_auth_middleware, AdminKey};
use crate::models::{CreateSiteRequest, SiteResponse, UpdateSiteRequest};
use crate::AppState;

fn error_response(e: DomainError) -> (StatusCode, String) {
    let status = match &e {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

fn site_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Site not found".to_string())
}

/// List all sites
#[utoipa::path(
    get,
    path = "/admin/sites",
    responses(
        (status = 200, description = "List of sites", body = Vec<SiteResponse>),
        (status = 401, description = "Missing or invalid admin key"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admin"
)]
pub async fn list_sites(
    State(state): State<AppState>,
) -> Result<Json<Vec<SiteResponse>>, (StatusCode, String)> {
    let sites = state.sites.list_all().await.map_err(error_response)?;
    Ok(Json(sites.into_iter().map(SiteResponse::from).collect()))
}

/// Register a site
#[utoipa::path(
    post,
    path = "/admin/sites",
    request_body = CreateSiteRequest,
    responses(
        (status = 201, description = "Site created", body = SiteResponse),
        (status = 409, description = "Group already registered"),
        (status = 422, description = "Invalid site"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admin"
)]
pub async fn create_site(
    State(state): State<AppState>,
    Json(payload): Json<CreateSiteRequest>,
) -> Result<(StatusCode, Json<SiteResponse>), (StatusCode, String)> {
    let site = state
        .sites
        .create(payload.into())
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(site.into())))
}

/// Get a site by chat group id
#[utoipa::path(
    get,
    path = "/admin/sites/{group_id}",
    params(
        ("group_id" = String, Path, description = "Chat group id")
    ),
    responses(
        (status = 200, description = "Site found", body = SiteResponse),
        (status = 404, description = "Site not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admin"
)]
pub async fn get_site(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<SiteResponse>, (StatusCode, String)> {
    let site = state
        .sites
        .get(&group_id)
        .await
        .map_err(error_response)?
        .ok_or_else(site_not_found)?;
    Ok(Json(site.into()))
}

/// Partially update a site
#[utoipa::path(
    patch,
    path = "/admin/sites/{group_id}",
    params(
        ("group_id" = String, Path, description = "Chat group id")
    ),
    request_body = UpdateSiteRequest,
    responses(
        (status = 200, description = "Site updated", body = SiteResponse),
        (status = 404, description = "Site not found"),
        (status = 422, description = "No fields to update"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admin"
)]
pub async fn update_site(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(payload): Json<UpdateSiteRequest>,
) -> Result<Json<SiteResponse>, (StatusCode, String)> {
    let site = state
        .sites
        .update(&group_id, payload.into())
        .await
        .map_err(error_response)?
        .ok_or_else(site_not_found)?;
    Ok(Json(site.into()))
}

/// Disable a site (soft delete)
#[utoipa::path(
    delete,
    path = "/admin/sites/{group_id}",
    params(
        ("group_id" = String, Path, description = "Chat group id")
    ),
    responses(
        (status = 200, description = "Site disabled", body = SiteResponse),
        (status = 404, description = "Site not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admin"
)]
pub async fn disable_site(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<SiteResponse>, (StatusCode, String)> {
    let site = state
        .sites
        .disable(&group_id)
        .await
        .map_err(error_response)?
        .ok_or_else(site_not_found)?;
    Ok(Json(site.into()))
}

/// Create admin router guarded by the admin key
pub fn router(admin_key: AdminKey) -> Router<AppState> {
    Router::new()
        .route("/admin/sites", get(list_sites).post(create_site))
        .route(
            "/admin/sites/:group_id",
            get(get_site).patch(update_site).delete(disable_site),
        )
        .route_layer(middleware::from_fn_with_state(
            admin_key,
            admin_auth_middleware,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ADMIN_KEY_HEADER;
    use crate::testing::TestApp;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    fn admin_request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(ADMIN_KEY_HEADER, TestApp::ADMIN_KEY)
            .header("content-type", "application/json");
        match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn site_body(response: axum::response::Response) -> SiteResponse {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_requires_admin_key() {
        let app = TestApp::new();
        let request = Request::builder()
            .uri("/admin/sites")
            .header(ADMIN_KEY_HEADER, "wrong")
            .body(Body::empty())
            .unwrap();

        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_then_conflict() {
        let app = TestApp::new();
        let body = json!({
            "group_id": "T2",
            "name": "North Tower",
            "context": { "locations": ["לובי"] }
        });

        let response = app
            .router()
            .oneshot(admin_request("POST", "/admin/sites", Some(body.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let site = site_body(response).await;
        assert_eq!(site.group_id, "T2");
        assert_eq!(site.context.locations, vec!["לובי"]);

        let response = app
            .router()
            .oneshot(admin_request("POST", "/admin/sites", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_patch_rules() {
        let app = TestApp::new();

        let empty = app
            .router()
            .oneshot(admin_request("PATCH", "/admin/sites/T1", Some(json!({}))))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let missing = app
            .router()
            .oneshot(admin_request("PATCH", "/admin/sites/T404", Some(json!({"name": "x"}))))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let renamed = app
            .router()
            .oneshot(admin_request("PATCH", "/admin/sites/T1", Some(json!({"name": "Renamed"}))))
            .await
            .unwrap();
        assert_eq!(renamed.status(), StatusCode::OK);
        assert_eq!(site_body(renamed).await.name.as_deref(), Some("Renamed"));
    }

    #[tokio::test]
    async fn test_delete_disables_and_get_reflects_it() {
        let app = TestApp::new();

        let response = app
            .router()
            .oneshot(admin_request("DELETE", "/admin/sites/T1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(site_body(response).await.training_phase, "Disabled");

        let response = app
            .router()
            .oneshot(admin_request("GET", "/admin/sites/T1", None))
            .await
            .unwrap();
        assert_eq!(site_body(response).await.training_phase, "Disabled");

        let response = app
            .router()
            .oneshot(admin_request("GET", "/admin/sites/T404", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
