use axum::{extract::State, response::Response, routing::get, Router};

use crate::errors::ServiceError;
use crate::handlers::common::success_response;
use crate::services::history::HistoryEntry;
use crate::session::UserId;
use crate::AppState;

/// Creates the router for browsing-history endpoints
pub fn history_routes() -> Router<AppState> {
    Router::new().route("/", get(list_history))
}

/// The user's recently viewed products
#[utoipa::path(
    get,
    path = "/api/v1/history",
    responses(
        (status = 200, description = "Recently viewed products", body = [HistoryEntry]),
        (status = 401, description = "Missing user header", body = crate::errors::ErrorResponse)
    ),
    tag = "History"
)]
pub async fn list_history(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Response, ServiceError> {
    let entries = state.services.history.list(user.0).await?;
    Ok(success_response(entries))
}
