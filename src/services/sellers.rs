use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{product, seller, seller_offer, Product, Seller, SellerOffer};
use crate::errors::ServiceError;

const TOP_PRODUCTS: u64 = 10;

/// One product on a seller's card, priced at that seller's offer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SellerProduct {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    #[schema(value_type = String, example = "89.00")]
    pub price: Decimal,
    pub count_sells: i32,
}

/// The seller page payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SellerCard {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    /// The seller's best-selling products, at most ten.
    pub top_products: Vec<SellerProduct>,
}

/// Seller pages.
#[derive(Clone)]
pub struct SellerService {
    db: Arc<DbPool>,
}

impl SellerService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// The seller card: profile plus their top products by sales count.
    #[instrument(skip(self))]
    pub async fn card(&self, slug: &str) -> Result<SellerCard, ServiceError> {
        let seller = Seller::find()
            .filter(seller::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Seller '{}' not found", slug)))?;

        let rows: Vec<(seller_offer::Model, Option<product::Model>)> = SellerOffer::find()
            .filter(seller_offer::Column::SellerId.eq(seller.id))
            .find_also_related(Product)
            .filter(product::Column::Archived.eq(false))
            .order_by_desc(product::Column::CountSells)
            .limit(TOP_PRODUCTS)
            .all(&*self.db)
            .await?;

        let top_products = rows
            .into_iter()
            .filter_map(|(offer, product)| {
                product.map(|p| SellerProduct {
                    id: p.id,
                    slug: p.slug,
                    name: p.name,
                    price: offer.price,
                    count_sells: p.count_sells,
                })
            })
            .collect();

        Ok(SellerCard {
            id: seller.id,
            slug: seller.slug,
            name: seller.name,
            description: seller.description,
            top_products,
        })
    }
}
