use axum::{extract::State, response::Response, routing::get, Router};

use crate::errors::ServiceError;
use crate::handlers::common::success_response;
use crate::services::discounts::SaleSummary;
use crate::AppState;

/// Creates the router for sale-page endpoints
pub fn sales_routes() -> Router<AppState> {
    Router::new().route("/", get(list_sales))
}

/// Current discounts for the sale-page navigation
#[utoipa::path(
    get,
    path = "/api/v1/sales",
    responses(
        (status = 200, description = "Current discounts", body = [SaleSummary])
    ),
    tag = "Sales"
)]
pub async fn list_sales(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let sales = state.services.discounts.list_current().await?;
    Ok(success_response(sales))
}
