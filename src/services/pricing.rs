use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{seller_offer, SellerOffer};
use crate::errors::ServiceError;
use crate::services::discounts::{apply_discount, DiscountEngine};

/// Price aggregates of one product, derived from its live offers.
///
/// A product without offers gets `Decimal::ZERO` everywhere; it is not
/// purchasable and the catalog hides it anyway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceStats {
    /// Cheapest offer across sellers.
    #[schema(value_type = String, example = "199.00")]
    pub min: Decimal,
    /// Mean offer price, two decimals, half-up.
    #[schema(value_type = String, example = "219.50")]
    pub avg: Decimal,
    /// `min` after the best current discount.
    #[schema(value_type = String, example = "149.25")]
    pub discounted_min: Decimal,
    /// `avg` after the best current discount.
    #[schema(value_type = String, example = "164.63")]
    pub discounted_avg: Decimal,
}

impl PriceStats {
    pub fn zero() -> Self {
        Self {
            min: Decimal::ZERO,
            avg: Decimal::ZERO,
            discounted_min: Decimal::ZERO,
            discounted_avg: Decimal::ZERO,
        }
    }
}

/// Minimum of the given offer prices, ZERO when there are none.
pub(crate) fn min_price(prices: &[Decimal]) -> Decimal {
    prices.iter().min().copied().unwrap_or(Decimal::ZERO)
}

/// Mean of the given offer prices rounded to two decimals (half-up), ZERO
/// when there are none.
pub(crate) fn avg_price(prices: &[Decimal]) -> Decimal {
    if prices.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = prices.iter().copied().sum();
    (sum / Decimal::from(prices.len()))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Read-only price statistics over a product's seller offers.
#[derive(Clone)]
pub struct PricingService {
    db: Arc<DbPool>,
    discounts: Arc<dyn DiscountEngine>,
}

impl PricingService {
    pub fn new(db: Arc<DbPool>, discounts: Arc<dyn DiscountEngine>) -> Self {
        Self { db, discounts }
    }

    /// Computes the price aggregates for one product.
    #[instrument(skip(self))]
    pub async fn stats(
        &self,
        product_id: Uuid,
        category_id: Uuid,
    ) -> Result<PriceStats, ServiceError> {
        let prices: Vec<Decimal> = SellerOffer::find()
            .select_only()
            .column(seller_offer::Column::Price)
            .filter(seller_offer::Column::ProductId.eq(product_id))
            .into_tuple()
            .all(&*self.db)
            .await?;

        if prices.is_empty() {
            return Ok(PriceStats::zero());
        }

        let min = min_price(&prices);
        let avg = avg_price(&prices);

        let (discounted_min, discounted_avg) =
            match self.discounts.best_for(product_id, category_id).await? {
                Some(d) => (
                    apply_discount(d.kind, d.value, min),
                    apply_discount(d.kind, d.value, avg),
                ),
                None => (min, avg),
            };

        Ok(PriceStats {
            min,
            avg,
            discounted_min,
            discounted_avg,
        })
    }

    /// Runs one price through the best current discount for a product.
    /// Returns the price unchanged when no discount applies.
    #[instrument(skip(self))]
    pub async fn discounted(
        &self,
        product_id: Uuid,
        category_id: Uuid,
        price: Decimal,
    ) -> Result<Decimal, ServiceError> {
        match self.discounts.best_for(product_id, category_id).await? {
            Some(d) => Ok(apply_discount(d.kind, d.value, price)),
            None => Ok(price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn no_offers_yield_zero() {
        assert_eq!(min_price(&[]), Decimal::ZERO);
        assert_eq!(avg_price(&[]), Decimal::ZERO);
        assert_eq!(PriceStats::zero().min, Decimal::ZERO);
    }

    #[test]
    fn min_picks_the_cheapest_offer() {
        assert_eq!(
            min_price(&[dec!(12.00), dec!(9.99), dec!(30.00)]),
            dec!(9.99)
        );
    }

    #[test]
    fn avg_rounds_half_up_to_cents() {
        // (10 + 10 + 10.01) / 3 = 10.00333... -> 10.00
        assert_eq!(
            avg_price(&[dec!(10.00), dec!(10.00), dec!(10.01)]),
            dec!(10.00)
        );
        // (1 + 2) / 2 = 1.50
        assert_eq!(avg_price(&[dec!(1.00), dec!(2.00)]), dec!(1.50));
        // (0.10 + 0.11 + 0.10) / 3 = 0.10333... -> 0.10; half-up case:
        // (0.01 + 0.02) / 2 = 0.015 -> 0.02
        assert_eq!(avg_price(&[dec!(0.01), dec!(0.02)]), dec!(0.02));
    }

    #[test]
    fn single_offer_is_its_own_aggregate() {
        assert_eq!(min_price(&[dec!(42.00)]), dec!(42.00));
        assert_eq!(avg_price(&[dec!(42.00)]), dec!(42.00));
    }
}
