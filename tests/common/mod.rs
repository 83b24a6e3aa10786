//! Shared harness for the HTTP integration tests.
//!
//! Each test gets its own sqlite database in a temp directory, migrated
//! from scratch, an in-memory cache, and the full application router.
//! Requests go through `tower::ServiceExt::oneshot`, so the whole stack
//! (extractors, method gates, error rendering) is exercised without a
//! listening socket.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use bazaar_api::cache::{CacheBackend, InMemoryCache};
use bazaar_api::config::AppConfig;
use bazaar_api::db::{self, DbPool};
use bazaar_api::entities::{
    browsing_history, cart_item, category, discount, discount_category, discount_product, product,
    product_tag, property, property_value, review, seller, seller_offer, tag, DiscountKind,
};
use bazaar_api::events::{process_events, EventSender};
use bazaar_api::handlers::AppServices;
use bazaar_api::session::{SessionStore, SESSION_ID_HEADER, USER_ID_HEADER};
use bazaar_api::{app_router, AppState};

/// Page size the harness configures; small enough to exercise pagination
/// with a handful of seeded products.
pub const TEST_PAGE_SIZE: u64 = 4;

pub struct TestApp {
    pub router: Router,
    pub db: Arc<DbPool>,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let tmp = TempDir::new().expect("temp dir for test database");
        let db_path = tmp.path().join("bazaar-test.db");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let mut config = AppConfig::new(
            database_url,
            "redis://127.0.0.1:6379".into(),
            "127.0.0.1".into(),
            0,
            "development".into(),
        );
        config.catalog_page_size = TEST_PAGE_SIZE;

        let pool = db::establish_connection_from_app_config(&config)
            .await
            .expect("test database connection");
        db::run_migrations(&pool).await.expect("migrations");
        let db = Arc::new(pool);

        let cache: Arc<dyn CacheBackend> = Arc::new(InMemoryCache::new());
        let sessions = SessionStore::new(cache.clone(), config.session_ttl());

        let (event_tx, event_rx) = mpsc::channel(64);
        tokio::spawn(process_events(event_rx));
        let event_sender = EventSender::new(event_tx);

        let services = AppServices::build(
            db.clone(),
            cache.clone(),
            sessions.clone(),
            Arc::new(event_sender.clone()),
            &config,
        );

        let state = AppState {
            db: db.clone(),
            config: Arc::new(config),
            event_sender,
            cache,
            sessions,
            services,
        };

        Self {
            router: app_router(state),
            db,
            _tmp: tmp,
        }
    }

    /// Sends a request and returns the status with the raw body bytes.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        session: Option<&str>,
        user: Option<Uuid>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(sid) = session {
            builder = builder.header(SESSION_ID_HEADER, sid);
        }
        if let Some(uid) = user {
            builder = builder.header(USER_ID_HEADER, uid.to_string());
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        (status, bytes.to_vec())
    }

    /// Sends a request and parses the body as JSON (null for empty bodies).
    pub async fn request_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        session: Option<&str>,
        user: Option<Uuid>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.request(method, uri, body, session, user).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request_json(Method::GET, uri, None, None, None).await
    }

    pub async fn get_with_session(&self, uri: &str, session: &str) -> (StatusCode, Value) {
        self.request_json(Method::GET, uri, None, Some(session), None)
            .await
    }

    pub async fn get_as_user(&self, uri: &str, user: Uuid) -> (StatusCode, Value) {
        self.request_json(Method::GET, uri, None, None, Some(user))
            .await
    }
}

// ---------------------------------------------------------------------------
// Seed helpers. Each inserts one row with sensible defaults and returns the
// model, so tests read as a short fixture description.
// ---------------------------------------------------------------------------

pub fn price(value: &str) -> Decimal {
    value.parse().expect("decimal literal")
}

pub async fn seed_category(db: &DbPool, name: &str, slug: &str) -> category::Model {
    seed_subcategory(db, name, slug, None).await
}

pub async fn seed_subcategory(
    db: &DbPool,
    name: &str,
    slug: &str,
    parent_id: Option<Uuid>,
) -> category::Model {
    category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        is_active: Set(true),
        sort_index: Set(0),
        parent_id: Set(parent_id),
    }
    .insert(db)
    .await
    .expect("seed category")
}

pub async fn seed_product(
    db: &DbPool,
    category_id: Uuid,
    name: &str,
    slug: &str,
) -> product::Model {
    seed_product_full(db, category_id, name, slug, 0, false).await
}

pub async fn seed_product_full(
    db: &DbPool,
    category_id: Uuid,
    name: &str,
    slug: &str,
    count_sells: i32,
    archived: bool,
) -> product::Model {
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        description: Set(format!("{name} description")),
        count_sells: Set(count_sells),
        archived: Set(archived),
        sort_index: Set(0),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed product")
}

pub async fn seed_seller(db: &DbPool, name: &str, slug: &str) -> seller::Model {
    seller::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        description: Set(format!("{name} storefront")),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed seller")
}

pub async fn seed_offer(
    db: &DbPool,
    product_id: Uuid,
    seller_id: Uuid,
    unit_price: Decimal,
    count: i32,
) -> seller_offer::Model {
    seller_offer::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        seller_id: Set(seller_id),
        price: Set(unit_price),
        count: Set(count),
    }
    .insert(db)
    .await
    .expect("seed offer")
}

/// Product plus a single in-stock offer from a fresh seller; covers the
/// common case where a test only needs a purchasable product.
pub async fn seed_offered_product(
    db: &DbPool,
    category_id: Uuid,
    name: &str,
    slug: &str,
    unit_price: &str,
) -> (product::Model, seller_offer::Model) {
    let product = seed_product(db, category_id, name, slug).await;
    let seller = seed_seller(db, &format!("{name} seller"), &format!("{slug}-seller")).await;
    let offer = seed_offer(db, product.id, seller.id, price(unit_price), 10).await;
    (product, offer)
}

pub async fn seed_tag(db: &DbPool, name: &str, slug: &str) -> tag::Model {
    tag::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
    }
    .insert(db)
    .await
    .expect("seed tag")
}

pub async fn attach_tag(db: &DbPool, product_id: Uuid, tag_id: Uuid) {
    product_tag::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        tag_id: Set(tag_id),
    }
    .insert(db)
    .await
    .expect("attach tag");
}

pub async fn seed_property(db: &DbPool, category_id: Uuid, name: &str) -> property::Model {
    property::ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        name: Set(name.to_string()),
    }
    .insert(db)
    .await
    .expect("seed property")
}

pub async fn set_property_value(db: &DbPool, product_id: Uuid, property_id: Uuid, value: &str) {
    property_value::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        property_id: Set(property_id),
        value: Set(value.to_string()),
    }
    .insert(db)
    .await
    .expect("set property value");
}

pub async fn seed_review(db: &DbPool, product_id: Uuid, user_id: Uuid, text: &str) -> review::Model {
    review::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        user_id: Set(user_id),
        text: Set(text.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed review")
}

/// A discount running from yesterday until a month out.
pub async fn seed_discount(
    db: &DbPool,
    name: &str,
    slug: &str,
    kind: DiscountKind,
    value: Decimal,
    weight: i32,
) -> discount::Model {
    let now = Utc::now();
    discount::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        description: Set(format!("{name} promotion")),
        kind: Set(kind),
        value: Set(value),
        weight: Set(weight),
        active: Set(true),
        starts_at: Set(Some(now - ChronoDuration::days(1))),
        ends_at: Set(now + ChronoDuration::days(30)),
    }
    .insert(db)
    .await
    .expect("seed discount")
}

pub async fn attach_discount_to_product(db: &DbPool, discount_id: Uuid, product_id: Uuid) {
    discount_product::ActiveModel {
        id: Set(Uuid::new_v4()),
        discount_id: Set(discount_id),
        product_id: Set(product_id),
    }
    .insert(db)
    .await
    .expect("attach discount to product");
}

pub async fn attach_discount_to_category(db: &DbPool, discount_id: Uuid, category_id: Uuid) {
    discount_category::ActiveModel {
        id: Set(Uuid::new_v4()),
        discount_id: Set(discount_id),
        category_id: Set(category_id),
    }
    .insert(db)
    .await
    .expect("attach discount to category");
}

pub async fn seed_history_entry(db: &DbPool, user_id: Uuid, product_id: Uuid) {
    browsing_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        product_id: Set(product_id),
        viewed_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed history entry");
}

pub async fn seed_cart_item(db: &DbPool, user_id: Uuid, offer_id: Uuid, quantity: i32) {
    cart_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        offer_id: Set(offer_id),
        quantity: Set(quantity),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed cart item");
}

/// A discount that ended last week; must never surface as current.
pub async fn seed_expired_discount(db: &DbPool, name: &str, slug: &str) -> discount::Model {
    let now = Utc::now();
    discount::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        description: Set(format!("{name} promotion")),
        kind: Set(DiscountKind::Percent),
        value: Set(price("10")),
        weight: Set(1),
        active: Set(true),
        starts_at: Set(Some(now - ChronoDuration::days(30))),
        ends_at: Set(now - ChronoDuration::days(7)),
    }
    .insert(db)
    .await
    .expect("seed expired discount")
}
