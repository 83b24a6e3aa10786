use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::handlers::common::{access_denied, success_response};
use crate::services::cart::{CartAmount, CartChange, CartSummary};
use crate::session::UserId;
use crate::AppState;

/// Creates the router for cart endpoints. Mutating routes are method-gated.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_summary))
        .route("/amt", get(cart_amount))
        .route("/total", get(cart_total))
        .route(
            "/add/:slug/:offer_id",
            post(add_to_cart).fallback(access_denied),
        )
        .route(
            "/change/:slug/:delta/:offer_id",
            post(change_quantity).fallback(access_denied),
        )
        .route(
            "/remove/:slug/:offer_id",
            delete(remove_from_cart).fallback(access_denied),
        )
}

/// The cart page payload
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    responses(
        (status = 200, description = "Cart lines and total", body = CartSummary),
        (status = 401, description = "Missing user header", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn cart_summary(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Response, ServiceError> {
    let summary = state.services.cart.summary(user.0).await?;
    Ok(success_response(summary))
}

/// Total units in the cart
#[utoipa::path(
    get,
    path = "/api/v1/cart/amt",
    responses(
        (status = 200, description = "Unit count", body = CartAmount)
    ),
    tag = "Cart"
)]
pub async fn cart_amount(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Response, ServiceError> {
    let amount = state.services.cart.amount(user.0).await?;
    Ok(success_response(amount))
}

/// Grand total of the cart
#[utoipa::path(
    get,
    path = "/api/v1/cart/total",
    responses(
        (status = 200, description = "Cart total as a decimal string")
    ),
    tag = "Cart"
)]
pub async fn cart_total(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Response, ServiceError> {
    let total = state.services.cart.total(user.0).await?;
    Ok(success_response(json!({ "total": total })))
}

/// Put one unit of an offer into the cart
#[utoipa::path(
    post,
    path = "/api/v1/cart/add/{slug}/{offer_id}",
    params(
        ("slug" = String, Path, description = "Product slug"),
        ("offer_id" = Uuid, Path, description = "Seller offer")
    ),
    responses(
        (status = 200, description = "New cart size", body = CartAmount),
        (status = 404, description = "Unknown product or offer", body = crate::errors::ErrorResponse),
        (status = 405, description = "Wrong method: plain `access denied` body")
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: UserId,
    Path((slug, offer_id)): Path<(String, Uuid)>,
) -> Result<Response, ServiceError> {
    let amount = state.services.cart.add(user.0, &slug, offer_id).await?;
    Ok(success_response(amount))
}

/// Change a line's quantity by a wire-encoded delta
#[utoipa::path(
    post,
    path = "/api/v1/cart/change/{slug}/{delta}/{offer_id}",
    params(
        ("slug" = String, Path, description = "Product slug"),
        ("delta" = i32, Path, description = "Quantity delta; code 2 means decrement by one"),
        ("offer_id" = Uuid, Path, description = "Seller offer")
    ),
    responses(
        (status = 200, description = "New cart size and line price", body = CartChange),
        (status = 404, description = "Line not in cart", body = crate::errors::ErrorResponse),
        (status = 405, description = "Wrong method: plain `access denied` body")
    ),
    tag = "Cart"
)]
pub async fn change_quantity(
    State(state): State<AppState>,
    user: UserId,
    Path((slug, delta, offer_id)): Path<(String, i32, Uuid)>,
) -> Result<Response, ServiceError> {
    let change = state
        .services
        .cart
        .change(user.0, &slug, delta, offer_id)
        .await?;
    Ok(success_response(change))
}

/// Drop a line from the cart
#[utoipa::path(
    delete,
    path = "/api/v1/cart/remove/{slug}/{offer_id}",
    params(
        ("slug" = String, Path, description = "Product slug"),
        ("offer_id" = Uuid, Path, description = "Seller offer")
    ),
    responses(
        (status = 200, description = "New cart size", body = CartAmount),
        (status = 404, description = "Unknown product or offer", body = crate::errors::ErrorResponse),
        (status = 405, description = "Wrong method: plain `access denied` body")
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: UserId,
    Path((slug, offer_id)): Path<(String, Uuid)>,
) -> Result<Response, ServiceError> {
    let amount = state.services.cart.remove(user.0, &slug, offer_id).await?;
    Ok(success_response(amount))
}
