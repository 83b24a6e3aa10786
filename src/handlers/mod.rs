use std::sync::Arc;

use crate::cache::CacheBackend;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::repositories::SeaOrmProductRepository;
use crate::services;
use crate::session::SessionStore;

pub mod cart;
pub mod catalog;
pub mod categories;
pub mod common;
pub mod compare;
pub mod health;
pub mod history;
pub mod products;
pub mod sales;
pub mod sellers;

/// The service container shared by all HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<services::CatalogService>,
    pub compare: Arc<services::CompareService>,
    pub cart: Arc<services::CartService>,
    pub products: Arc<services::ProductDetailService>,
    pub pricing: services::PricingService,
    pub discounts: Arc<services::DiscountService>,
    pub sellers: Arc<services::SellerService>,
    pub history: Arc<services::HistoryService>,
    pub categories: Arc<services::CategoryService>,
}

impl AppServices {
    /// Wires the service graph: one repository, one discount engine, shared
    /// session store and cache.
    pub fn build(
        db: Arc<DbPool>,
        cache: Arc<dyn CacheBackend>,
        sessions: SessionStore,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
    ) -> Self {
        let repo = Arc::new(SeaOrmProductRepository::new(db.clone()));
        let discounts = Arc::new(services::DiscountService::new(db.clone()));
        let pricing = services::PricingService::new(db.clone(), discounts.clone());

        let catalog = Arc::new(services::CatalogService::new(
            repo,
            sessions.clone(),
            discounts.clone(),
            config.catalog_page_size,
        ));
        let compare = Arc::new(services::CompareService::new(
            db.clone(),
            sessions.clone(),
            event_sender.clone(),
            config.compare_limit,
        ));
        let cart = Arc::new(services::CartService::new(db.clone(), event_sender.clone()));
        let products = Arc::new(services::ProductDetailService::new(
            db.clone(),
            cache,
            pricing.clone(),
            event_sender,
            config.detail_cache_ttl(),
        ));
        let sellers = Arc::new(services::SellerService::new(db.clone()));
        let history = Arc::new(services::HistoryService::new(
            db.clone(),
            config.browsing_history_limit,
        ));
        let categories = Arc::new(services::CategoryService::new(db));

        Self {
            catalog,
            compare,
            cart,
            products,
            pricing,
            discounts,
            sellers,
            history,
            categories,
        }
    }
}
