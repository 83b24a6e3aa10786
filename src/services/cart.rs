use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    cart_item, CartItem, CartItemModel, Product, Seller, SellerOffer, SellerOfferModel,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Decodes the quantity-change wire convention.
///
/// The storefront's stepper sends `2` for "one less"; every other integer
/// is a literal delta.
pub(crate) fn decode_delta(code: i32) -> i32 {
    if code == 2 {
        -1
    } else {
        code
    }
}

/// Total units across a cart, returned by the mutating endpoints so the
/// badge in the page header can update without a second request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartAmount {
    pub amt: i64,
}

/// Result of a quantity change: the new cart size and the changed line's
/// price (zero when the line was removed).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartChange {
    pub amt: i64,
    #[schema(value_type = String, example = "59.98")]
    pub price: Decimal,
}

/// One row of the cart page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLine {
    pub offer_id: Uuid,
    pub product_name: String,
    pub product_slug: String,
    pub seller_name: String,
    #[schema(value_type = String, example = "29.99")]
    pub unit_price: Decimal,
    pub quantity: i32,
    #[schema(value_type = String, example = "59.98")]
    pub line_total: Decimal,
}

/// The whole cart with its grand total.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    #[schema(value_type = String, example = "139.97")]
    pub total: Decimal,
}

/// Per-user cart mutations and totals.
///
/// Every row is keyed by (user, offer); add/change run inside a transaction
/// so concurrent submits from one user settle on a consistent row.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Loads an offer and checks it belongs to the product named by `slug`.
    async fn offer_for<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_slug: &str,
        offer_id: Uuid,
    ) -> Result<SellerOfferModel, ServiceError> {
        let offer = SellerOffer::find_by_id(offer_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Offer {} not found", offer_id)))?;

        let product = Product::find_by_id(offer.product_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product for offer {} not found", offer_id))
            })?;

        if product.slug != product_slug || product.archived {
            return Err(ServiceError::NotFound(format!(
                "Product '{}' has no offer {}",
                product_slug, offer_id
            )));
        }

        Ok(offer)
    }

    async fn find_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
        offer_id: Uuid,
    ) -> Result<Option<CartItemModel>, ServiceError> {
        Ok(CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::OfferId.eq(offer_id))
            .one(conn)
            .await?)
    }

    async fn total_quantity<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<i64, ServiceError> {
        let items = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .all(conn)
            .await?;
        Ok(items.iter().map(|i| i.quantity as i64).sum())
    }

    /// Puts one unit of an offer into the cart, or bumps the existing line.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: Uuid,
        product_slug: &str,
        offer_id: Uuid,
    ) -> Result<CartAmount, ServiceError> {
        let txn = self.db.begin().await?;
        let offer = self.offer_for(&txn, product_slug, offer_id).await?;

        match self.find_line(&txn, user_id, offer.id).await? {
            Some(line) => {
                let quantity = line.quantity + 1;
                let mut active: cart_item::ActiveModel = line.into();
                active.quantity = Set(quantity);
                active.update(&txn).await?;
            }
            None => {
                cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    offer_id: Set(offer.id),
                    quantity: Set(1),
                    created_at: Set(Utc::now()),
                }
                .insert(&txn)
                .await?;
            }
        }

        let amt = self.total_quantity(&txn, user_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded { user_id, offer_id })
            .await;

        info!(%user_id, %offer_id, "Added offer to cart");
        Ok(CartAmount { amt })
    }

    /// Adjusts a line's quantity by the decoded wire delta. A quantity at or
    /// below zero removes the line instead of storing it.
    #[instrument(skip(self))]
    pub async fn change(
        &self,
        user_id: Uuid,
        product_slug: &str,
        delta_code: i32,
        offer_id: Uuid,
    ) -> Result<CartChange, ServiceError> {
        let delta = decode_delta(delta_code);

        let txn = self.db.begin().await?;
        let offer = self.offer_for(&txn, product_slug, offer_id).await?;

        let line = self
            .find_line(&txn, user_id, offer.id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Offer {} is not in the cart", offer_id))
            })?;

        let quantity = line.quantity + delta;
        let price = if quantity <= 0 {
            line.delete(&txn).await?;
            Decimal::ZERO
        } else {
            let mut active: cart_item::ActiveModel = line.into();
            active.quantity = Set(quantity);
            active.update(&txn).await?;
            offer.price * Decimal::from(quantity)
        };

        let amt = self.total_quantity(&txn, user_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartQuantityChanged {
                user_id,
                offer_id,
                quantity: quantity.max(0),
            })
            .await;

        Ok(CartChange { amt, price })
    }

    /// Drops a line from the cart. Removing an absent line is not an error.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        user_id: Uuid,
        product_slug: &str,
        offer_id: Uuid,
    ) -> Result<CartAmount, ServiceError> {
        let txn = self.db.begin().await?;
        let offer = self.offer_for(&txn, product_slug, offer_id).await?;

        if let Some(line) = self.find_line(&txn, user_id, offer.id).await? {
            line.delete(&txn).await?;
        }

        let amt = self.total_quantity(&txn, user_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved { user_id, offer_id })
            .await;

        Ok(CartAmount { amt })
    }

    /// The cart page payload: one line per offer plus the grand total.
    #[instrument(skip(self))]
    pub async fn summary(&self, user_id: Uuid) -> Result<CartSummary, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .find_also_related(SellerOffer)
            .all(&*self.db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        let mut total = Decimal::ZERO;

        for (line, offer) in rows {
            let Some(offer) = offer else {
                // Offer withdrawn while in a cart; skip the orphan.
                continue;
            };
            let product = Product::find_by_id(offer.product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Offer {} references a missing product",
                        offer.id
                    ))
                })?;
            let seller = offer
                .find_related(Seller)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Offer {} references a missing seller",
                        offer.id
                    ))
                })?;

            let line_total = offer.price * Decimal::from(line.quantity);
            total += line_total;
            items.push(CartLine {
                offer_id: offer.id,
                product_name: product.name,
                product_slug: product.slug,
                seller_name: seller.name,
                unit_price: offer.price,
                quantity: line.quantity,
                line_total,
            });
        }

        Ok(CartSummary { items, total })
    }

    /// Total units in the cart.
    #[instrument(skip(self))]
    pub async fn amount(&self, user_id: Uuid) -> Result<CartAmount, ServiceError> {
        let amt = self.total_quantity(&*self.db, user_id).await?;
        Ok(CartAmount { amt })
    }

    /// Grand total of the cart as a Decimal.
    #[instrument(skip(self))]
    pub async fn total(&self, user_id: Uuid) -> Result<Decimal, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .find_also_related(SellerOffer)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(line, offer)| offer.map(|o| o.price * Decimal::from(line.quantity)))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_code_two_means_minus_one() {
        assert_eq!(decode_delta(2), -1);
    }

    #[test]
    fn other_delta_codes_pass_through() {
        assert_eq!(decode_delta(1), 1);
        assert_eq!(decode_delta(-1), -1);
        assert_eq!(decode_delta(5), 5);
        assert_eq!(decode_delta(0), 0);
        assert_eq!(decode_delta(-3), -3);
    }
}

#[cfg(test)]
mod proptests {
    use super::decode_delta;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn only_code_two_is_remapped(code in -100i32..=100i32) {
            let decoded = decode_delta(code);
            if code == 2 {
                prop_assert_eq!(decoded, -1);
            } else {
                prop_assert_eq!(decoded, code);
            }
        }

        #[test]
        fn delta_sequences_leave_a_line_absent_or_positive(
            codes in proptest::collection::vec(-3i32..=3i32, 0..20)
        ) {
            // Mirrors the change rule: a line dropping to zero or below is
            // removed, and a removed line stays removed.
            let mut quantity: Option<i32> = Some(1);
            for code in codes {
                if let Some(q) = quantity {
                    let next = q + decode_delta(code);
                    quantity = (next > 0).then_some(next);
                }
            }
            prop_assert!(quantity.map_or(true, |q| q >= 1));
        }
    }
}
