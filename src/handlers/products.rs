use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::ServiceError;
use crate::handlers::common::{access_denied, created_response, success_response, validate_input};
use crate::services::products::ProductDetail;
use crate::session::UserId;
use crate::AppState;

/// Creates the router for product detail endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/:slug", get(get_product))
        .route("/:slug/reviews", post(create_review).fallback(access_denied))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReviewRequest {
    /// The review body.
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

/// Product detail page payload
#[utoipa::path(
    get,
    path = "/api/v1/products/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product detail", body = ProductDetail),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: Option<UserId>,
    Path(slug): Path<String>,
) -> Result<Response, ServiceError> {
    let detail = state
        .services
        .products
        .detail(&slug, user.map(|u| u.0))
        .await?;
    Ok(success_response(detail))
}

/// Submit a review on a product
#[utoipa::path(
    post,
    path = "/api/v1/products/{slug}/reviews",
    params(("slug" = String, Path, description = "Product slug")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing user header", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
        (status = 405, description = "Wrong method: plain `access denied` body")
    ),
    tag = "Products"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: UserId,
    Path(slug): Path<String>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let review = state
        .services
        .products
        .add_review(&slug, user.0, &payload.text)
        .await?;
    Ok(created_response(review))
}
