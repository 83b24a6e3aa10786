use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};

use crate::errors::ServiceError;
use crate::handlers::common::success_response;
use crate::services::sellers::SellerCard;
use crate::AppState;

/// Creates the router for seller endpoints
pub fn sellers_routes() -> Router<AppState> {
    Router::new().route("/:slug", get(get_seller))
}

/// Seller card with their top products
#[utoipa::path(
    get,
    path = "/api/v1/sellers/{slug}",
    params(("slug" = String, Path, description = "Seller slug")),
    responses(
        (status = 200, description = "Seller card", body = SellerCard),
        (status = 404, description = "Unknown seller", body = crate::errors::ErrorResponse)
    ),
    tag = "Sellers"
)]
pub async fn get_seller(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ServiceError> {
    let card = state.services.sellers.card(&slug).await?;
    Ok(success_response(card))
}
