//! Bazaar API Library
//!
//! Marketplace backend: catalog browsing, product comparison, shopping
//! carts, seller offers and discount pricing.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod repositories;
pub mod request_id;
pub mod services;
pub mod session;

use std::sync::Arc;

use axum::Router;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: events::EventSender,
    pub cache: Arc<dyn cache::CacheBackend>,
    pub sessions: session::SessionStore,
    pub services: handlers::AppServices,
}

/// The versioned API surface, mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/catalog", handlers::catalog::catalog_routes())
        .nest("/products", handlers::products::products_routes())
        .nest("/compare", handlers::compare::compare_routes())
        .nest("/cart", handlers::cart::cart_routes())
        .nest("/sellers", handlers::sellers::sellers_routes())
        .nest("/history", handlers::history::history_routes())
        .nest("/sales", handlers::sales::sales_routes())
        .nest("/categories", handlers::categories::categories_routes())
        .nest("/health", handlers::health::health_routes())
}

/// Builds the application router for the given state: the v1 API, Swagger
/// UI, and the request-id layer every request passes through.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", axum::routing::get(|| async { "bazaar-api up" }))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}
