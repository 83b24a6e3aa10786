use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::ServiceError;
use crate::handlers::common::success_response;
use crate::services::catalog::{CatalogListing, CatalogScope, CatalogSubmission};
use crate::session::SessionId;
use crate::AppState;

/// Creates the router for catalog endpoints
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_catalog).post(submit_filters))
        .route("/t/:tag", get(list_by_tag))
        .route("/category/:slug", get(list_by_category))
        .route("/sale/:slug", get(list_by_sale))
}

/// Catalog query string: raw page and sort code, both tolerated in any
/// shape (bad pages clamp, bad sort codes are ignored).
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CatalogParams {
    /// Page number; non-numeric or out-of-range values clamp silently.
    pub p: Option<String>,
    /// Sort wire code (`pop`, `-pop`, `pri`, `-pri`, `rev`, `-rev`, `cre`,
    /// `-cre`); `none` clears the session-persisted sort.
    pub sort: Option<String>,
}

/// List the catalog
#[utoipa::path(
    get,
    path = "/api/v1/catalog",
    params(CatalogParams),
    responses(
        (status = 200, description = "Catalog page", body = CatalogListing)
    ),
    tag = "Catalog"
)]
pub async fn list_catalog(
    State(state): State<AppState>,
    session: Option<SessionId>,
    Query(params): Query<CatalogParams>,
) -> Result<Response, ServiceError> {
    let listing = state
        .services
        .catalog
        .browse(
            session.as_ref().map(SessionId::as_str),
            CatalogScope::all(),
            params.p,
            params.sort,
        )
        .await?;
    Ok(success_response(listing))
}

/// List products carrying a tag
#[utoipa::path(
    get,
    path = "/api/v1/catalog/t/{tag}",
    params(
        ("tag" = String, Path, description = "Tag slug"),
        CatalogParams
    ),
    responses(
        (status = 200, description = "Catalog page", body = CatalogListing),
        (status = 404, description = "Unknown tag", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn list_by_tag(
    State(state): State<AppState>,
    session: Option<SessionId>,
    Path(tag): Path<String>,
    Query(params): Query<CatalogParams>,
) -> Result<Response, ServiceError> {
    let listing = state
        .services
        .catalog
        .browse(
            session.as_ref().map(SessionId::as_str),
            CatalogScope::tag(tag),
            params.p,
            params.sort,
        )
        .await?;
    Ok(success_response(listing))
}

/// List products of a category and its subcategories
#[utoipa::path(
    get,
    path = "/api/v1/catalog/category/{slug}",
    params(
        ("slug" = String, Path, description = "Category slug"),
        CatalogParams
    ),
    responses(
        (status = 200, description = "Catalog page", body = CatalogListing),
        (status = 404, description = "Unknown category", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn list_by_category(
    State(state): State<AppState>,
    session: Option<SessionId>,
    Path(slug): Path<String>,
    Query(params): Query<CatalogParams>,
) -> Result<Response, ServiceError> {
    let listing = state
        .services
        .catalog
        .browse(
            session.as_ref().map(SessionId::as_str),
            CatalogScope::category(slug),
            params.p,
            params.sort,
        )
        .await?;
    Ok(success_response(listing))
}

/// List products covered by a sale
#[utoipa::path(
    get,
    path = "/api/v1/catalog/sale/{slug}",
    params(
        ("slug" = String, Path, description = "Discount slug"),
        CatalogParams
    ),
    responses(
        (status = 200, description = "Catalog page", body = CatalogListing),
        (status = 404, description = "Unknown sale", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn list_by_sale(
    State(state): State<AppState>,
    session: Option<SessionId>,
    Path(slug): Path<String>,
    Query(params): Query<CatalogParams>,
) -> Result<Response, ServiceError> {
    let listing = state
        .services
        .catalog
        .browse(
            session.as_ref().map(SessionId::as_str),
            CatalogScope::sale(slug),
            params.p,
            params.sort,
        )
        .await?;
    Ok(success_response(listing))
}

/// Store search text and filter panel state in the session
#[utoipa::path(
    post,
    path = "/api/v1/catalog",
    request_body = CatalogSubmission,
    responses(
        (status = 200, description = "First page of the filtered catalog", body = CatalogListing)
    ),
    tag = "Catalog"
)]
pub async fn submit_filters(
    State(state): State<AppState>,
    session: Option<SessionId>,
    Json(submission): Json<CatalogSubmission>,
) -> Result<Response, ServiceError> {
    let listing = state
        .services
        .catalog
        .submit(session.as_ref().map(SessionId::as_str), submission)
        .await?;
    Ok(success_response(listing))
}
