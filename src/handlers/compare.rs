use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, get, post},
    Router,
};

use crate::errors::ServiceError;
use crate::handlers::common::{access_denied, success_response};
use crate::services::compare::{CompareAmount, CompareTable};
use crate::session::SessionId;
use crate::AppState;

/// Creates the router for comparison endpoints.
///
/// The mutating routes are method-gated: any verb other than the intended
/// one gets the storefront's plain `access denied` reply.
pub fn compare_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(compare_table))
        .route("/amt", get(compare_amount))
        .route("/add/:slug", post(add_to_compare).fallback(access_denied))
        .route(
            "/delete/:slug",
            delete(remove_from_compare).fallback(access_denied),
        )
        .route(
            "/delete_all",
            delete(clear_compare).fallback(access_denied),
        )
}

/// The comparison table
#[utoipa::path(
    get,
    path = "/api/v1/compare",
    responses(
        (status = 200, description = "Comparison table", body = CompareTable),
        (status = 400, description = "Missing session header", body = crate::errors::ErrorResponse)
    ),
    tag = "Compare"
)]
pub async fn compare_table(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Response, ServiceError> {
    let table = state.services.compare.table(session.as_str()).await?;
    Ok(success_response(table))
}

/// Size of the comparison list
#[utoipa::path(
    get,
    path = "/api/v1/compare/amt",
    responses(
        (status = 200, description = "List size", body = CompareAmount)
    ),
    tag = "Compare"
)]
pub async fn compare_amount(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Response, ServiceError> {
    let amount = state.services.compare.count(session.as_str()).await?;
    Ok(success_response(amount))
}

/// Add a product to the comparison list
#[utoipa::path(
    post,
    path = "/api/v1/compare/add/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "New list size", body = CompareAmount),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
        (status = 409, description = "Comparison list is full", body = crate::errors::ErrorResponse),
        (status = 405, description = "Wrong method: plain `access denied` body")
    ),
    tag = "Compare"
)]
pub async fn add_to_compare(
    State(state): State<AppState>,
    session: SessionId,
    Path(slug): Path<String>,
) -> Result<Response, ServiceError> {
    let amount = state.services.compare.add(session.as_str(), &slug).await?;
    Ok(success_response(amount))
}

/// Remove one product from the comparison list
#[utoipa::path(
    delete,
    path = "/api/v1/compare/delete/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "New list size", body = CompareAmount),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
        (status = 405, description = "Wrong method: plain `access denied` body")
    ),
    tag = "Compare"
)]
pub async fn remove_from_compare(
    State(state): State<AppState>,
    session: SessionId,
    Path(slug): Path<String>,
) -> Result<Response, ServiceError> {
    let amount = state
        .services
        .compare
        .remove(session.as_str(), &slug)
        .await?;
    Ok(success_response(amount))
}

/// Empty the comparison list
#[utoipa::path(
    delete,
    path = "/api/v1/compare/delete_all",
    responses(
        (status = 200, description = "Emptied list", body = CompareAmount),
        (status = 405, description = "Wrong method: plain `access denied` body")
    ),
    tag = "Compare"
)]
pub async fn clear_compare(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Response, ServiceError> {
    let amount = state.services.compare.clear(session.as_str()).await?;
    Ok(success_response(amount))
}
