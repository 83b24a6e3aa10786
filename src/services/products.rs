use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cache::CacheBackend;
use crate::db::DbPool;
use crate::entities::{
    browsing_history, product, review, BrowsingHistory, Category, Product, ProductModel, Property,
    PropertyValue, Review, ReviewModel, Seller, SellerOffer, Tag,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::pricing::{PriceStats, PricingService};

/// One seller's offer as shown on the detail page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfferView {
    pub offer_id: Uuid,
    pub seller_name: String,
    pub seller_slug: String,
    #[schema(value_type = String, example = "219.00")]
    pub price: Decimal,
    pub count: i32,
}

/// A property name/value pair on the detail page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PropertyView {
    pub name: String,
    pub value: String,
}

/// The assembled product detail payload. Serializable because it is what
/// gets memoized in the cache.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductDetail {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub category_name: String,
    pub category_slug: String,
    pub tags: Vec<String>,
    pub properties: Vec<PropertyView>,
    pub offers: Vec<OfferView>,
    pub review_count: u64,
    pub prices: PriceStats,
    pub created_at: DateTime<Utc>,
}

fn detail_cache_key(product_id: Uuid) -> String {
    format!("product_details:{}", product_id)
}

/// Product detail assembly, review submission and view tracking.
///
/// The detail payload is memoized per product; any write path that affects
/// it drops the cache entry and lets the next read rebuild it.
#[derive(Clone)]
pub struct ProductDetailService {
    db: Arc<DbPool>,
    cache: Arc<dyn CacheBackend>,
    pricing: PricingService,
    event_sender: Arc<EventSender>,
    detail_ttl: Duration,
}

impl ProductDetailService {
    pub fn new(
        db: Arc<DbPool>,
        cache: Arc<dyn CacheBackend>,
        pricing: PricingService,
        event_sender: Arc<EventSender>,
        detail_ttl: Duration,
    ) -> Self {
        Self {
            db,
            cache,
            pricing,
            event_sender,
            detail_ttl,
        }
    }

    async fn visible_product(&self, slug: &str) -> Result<ProductModel, ServiceError> {
        Product::find()
            .filter(product::Column::Slug.eq(slug))
            .filter(product::Column::Archived.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))
    }

    /// Serves the detail page payload, cached per product. Viewing also
    /// upserts the user's browsing history and emits `ProductViewed`,
    /// cache hit or not.
    #[instrument(skip(self))]
    pub async fn detail(
        &self,
        slug: &str,
        user_id: Option<Uuid>,
    ) -> Result<ProductDetail, ServiceError> {
        let product = self.visible_product(slug).await?;

        let detail = match self.cached_detail(product.id).await {
            Some(detail) => detail,
            None => {
                let detail = self.assemble(&product).await?;
                self.store_detail(&detail).await;
                detail
            }
        };

        if let Some(user_id) = user_id {
            self.record_view(user_id, product.id).await?;
        }
        self.event_sender
            .send_or_log(Event::ProductViewed {
                product_id: product.id,
                user_id,
            })
            .await;

        Ok(detail)
    }

    /// Creates a review on a product and invalidates its cached detail.
    #[instrument(skip(self, text))]
    pub async fn add_review(
        &self,
        slug: &str,
        user_id: Uuid,
        text: &str,
    ) -> Result<ReviewModel, ServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::ValidationError(
                "Review text must not be empty".to_string(),
            ));
        }

        let product = self.visible_product(slug).await?;

        let review = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            user_id: Set(user_id),
            text: Set(text.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.invalidate(product.id).await;
        self.event_sender
            .send_or_log(Event::ReviewCreated {
                product_id: product.id,
                review_id: review.id,
            })
            .await;

        info!(%product.id, %review.id, "Review created");
        Ok(review)
    }

    /// Drops the memoized detail payload for a product.
    pub async fn invalidate(&self, product_id: Uuid) {
        if let Err(e) = self.cache.delete(&detail_cache_key(product_id)).await {
            warn!(%product_id, "Detail cache invalidation failed: {}", e);
        }
    }

    async fn cached_detail(&self, product_id: Uuid) -> Option<ProductDetail> {
        match self.cache.get(&detail_cache_key(product_id)).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(detail) => {
                    debug!(%product_id, "Detail cache hit");
                    Some(detail)
                }
                Err(e) => {
                    warn!(%product_id, "Discarding unreadable cached detail: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                // Cache trouble must never fail the page.
                warn!(%product_id, "Detail cache read failed: {}", e);
                None
            }
        }
    }

    async fn store_detail(&self, detail: &ProductDetail) {
        let json = match serde_json::to_string(detail) {
            Ok(json) => json,
            Err(e) => {
                warn!(product_id = %detail.id, "Detail serialization failed: {}", e);
                return;
            }
        };
        if let Err(e) = self
            .cache
            .set(&detail_cache_key(detail.id), &json, Some(self.detail_ttl))
            .await
        {
            warn!(product_id = %detail.id, "Detail cache write failed: {}", e);
        }
    }

    async fn assemble(&self, product: &ProductModel) -> Result<ProductDetail, ServiceError> {
        let category = Category::find_by_id(product.category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Product {} references a missing category",
                    product.id
                ))
            })?;

        let tags = product
            .find_related(Tag)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();

        let properties = PropertyValue::find()
            .filter(crate::entities::property_value::Column::ProductId.eq(product.id))
            .find_also_related(Property)
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|(value, property)| {
                property.map(|p| PropertyView {
                    name: p.name,
                    value: value.value,
                })
            })
            .collect();

        let offers = product
            .find_related(SellerOffer)
            .find_also_related(Seller)
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|(offer, seller)| {
                seller.map(|s| OfferView {
                    offer_id: offer.id,
                    seller_name: s.name,
                    seller_slug: s.slug,
                    price: offer.price,
                    count: offer.count,
                })
            })
            .collect();

        let review_count = Review::find()
            .filter(review::Column::ProductId.eq(product.id))
            .count(&*self.db)
            .await?;

        let prices = self.pricing.stats(product.id, product.category_id).await?;

        Ok(ProductDetail {
            id: product.id,
            slug: product.slug.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            category_name: category.name,
            category_slug: category.slug,
            tags,
            properties,
            offers,
            review_count,
            prices,
            created_at: product.created_at,
        })
    }

    /// Upserts the (user, product) browsing-history row, refreshing
    /// `viewed_at` on a repeat visit.
    async fn record_view(&self, user_id: Uuid, product_id: Uuid) -> Result<(), ServiceError> {
        let existing = BrowsingHistory::find()
            .filter(browsing_history::Column::UserId.eq(user_id))
            .filter(browsing_history::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?;

        match existing {
            Some(row) => {
                let mut active: browsing_history::ActiveModel = row.into();
                active.viewed_at = Set(Utc::now());
                active.update(&*self.db).await?;
            }
            None => {
                browsing_history::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    product_id: Set(product_id),
                    viewed_at: Set(Utc::now()),
                }
                .insert(&*self.db)
                .await?;
            }
        }
        Ok(())
    }
}
