use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Json, Router,
};

use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::categories::{CategoryNode, CreateCategoryInput};
use crate::AppState;

/// Creates the router for category endpoints
pub fn categories_routes() -> Router<AppState> {
    Router::new().route("/", get(list_categories).post(create_category))
}

/// The two-level category tree for the catalog navigation
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Active categories with children", body = [CategoryNode])
    ),
    tag = "Categories"
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let tree = state.services.categories.tree().await?;
    Ok(success_response(tree))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryInput,
    responses(
        (status = 201, description = "Category created"),
        (status = 400, description = "Nesting beyond one level or invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> Result<Response, ServiceError> {
    let category = state.services.categories.create(input).await?;
    Ok(created_response(category))
}
