use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{discount, discount_category, discount_product, Discount, DiscountKind, DiscountModel};
use crate::errors::ServiceError;

/// A discounted price never falls below one cent.
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Resolves the discount applicable to a product.
///
/// The trait is the seam between price statistics and promotion rules:
/// pricing only needs "the best current discount for this product", not the
/// targeting tables behind it.
#[async_trait]
pub trait DiscountEngine: Send + Sync {
    /// Best current discount for a product, directly targeted or through
    /// its category. `None` when nothing applies.
    async fn best_for(
        &self,
        product_id: Uuid,
        category_id: Uuid,
    ) -> Result<Option<DiscountModel>, ServiceError>;
}

/// Applies a discount to a base price.
///
/// `percent` and `fixed` subtract from the base; `set_price` replaces it.
/// The result is floored at [`MIN_PRICE`], so no promotion can push a price
/// to zero or below.
pub fn apply_discount(kind: DiscountKind, value: Decimal, price: Decimal) -> Decimal {
    let discounted = match kind {
        DiscountKind::Percent => price - price * value / Decimal::from(100),
        DiscountKind::Fixed => price - value,
        DiscountKind::SetPrice => value,
    };
    discounted.max(MIN_PRICE)
}

/// Among candidate discounts, the winner has the highest weight; ties go to
/// the one ending latest.
pub(crate) fn pick_best(mut candidates: Vec<DiscountModel>) -> Option<DiscountModel> {
    candidates.sort_by(|a, b| {
        b.weight
            .cmp(&a.weight)
            .then_with(|| b.ends_at.cmp(&a.ends_at))
    });
    candidates.into_iter().next()
}

/// One entry on the sales page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaleSummary {
    pub slug: String,
    pub name: String,
    pub kind: DiscountKind,
    #[schema(value_type = String, example = "15.00")]
    pub value: Decimal,
    pub ends_at: chrono::DateTime<Utc>,
}

impl From<DiscountModel> for SaleSummary {
    fn from(model: DiscountModel) -> Self {
        Self {
            slug: model.slug,
            name: model.name,
            kind: model.kind,
            value: model.value,
            ends_at: model.ends_at,
        }
    }
}

/// Promotion lookups over the discount tables.
#[derive(Clone)]
pub struct DiscountService {
    db: Arc<DbPool>,
}

impl DiscountService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists the current discounts for the sale-page navigation, heaviest
    /// first.
    #[instrument(skip(self))]
    pub async fn list_current(&self) -> Result<Vec<SaleSummary>, ServiceError> {
        let discounts = Discount::find()
            .filter(Discount::currently_live())
            .order_by_desc(discount::Column::Weight)
            .order_by_asc(discount::Column::EndsAt)
            .all(&*self.db)
            .await?;

        Ok(discounts.into_iter().map(SaleSummary::from).collect())
    }
}

#[async_trait]
impl DiscountEngine for DiscountService {
    #[instrument(skip(self))]
    async fn best_for(
        &self,
        product_id: Uuid,
        category_id: Uuid,
    ) -> Result<Option<DiscountModel>, ServiceError> {
        let direct = Query::select()
            .column((
                discount_product::Entity,
                discount_product::Column::DiscountId,
            ))
            .from(discount_product::Entity)
            .and_where(
                Expr::col((discount_product::Entity, discount_product::Column::ProductId))
                    .eq(product_id),
            )
            .to_owned();

        let by_category = Query::select()
            .column((
                discount_category::Entity,
                discount_category::Column::DiscountId,
            ))
            .from(discount_category::Entity)
            .and_where(
                Expr::col((
                    discount_category::Entity,
                    discount_category::Column::CategoryId,
                ))
                .eq(category_id),
            )
            .to_owned();

        let candidates = Discount::find()
            .filter(Discount::currently_live())
            .filter(
                Condition::any()
                    .add(discount::Column::Id.in_subquery(direct))
                    .add(discount::Column::Id.in_subquery(by_category)),
            )
            .all(&*self.db)
            .await?;

        Ok(pick_best(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn discount(weight: i32, ends_in_days: i64) -> DiscountModel {
        DiscountModel {
            id: Uuid::new_v4(),
            name: format!("w{}", weight),
            slug: format!("w{}", weight),
            description: String::new(),
            kind: DiscountKind::Percent,
            value: dec!(10.00),
            weight,
            active: true,
            starts_at: None,
            ends_at: Utc::now() + Duration::days(ends_in_days),
        }
    }

    #[test]
    fn percent_subtracts_a_share_of_the_base() {
        assert_eq!(
            apply_discount(DiscountKind::Percent, dec!(25.00), dec!(200.00)),
            dec!(150.00)
        );
    }

    #[test]
    fn fixed_subtracts_the_value() {
        assert_eq!(
            apply_discount(DiscountKind::Fixed, dec!(30.00), dec!(100.00)),
            dec!(70.00)
        );
    }

    #[test]
    fn set_price_replaces_the_base() {
        assert_eq!(
            apply_discount(DiscountKind::SetPrice, dec!(9.99), dec!(100.00)),
            dec!(9.99)
        );
    }

    #[test]
    fn discounted_price_floors_at_one_cent() {
        assert_eq!(
            apply_discount(DiscountKind::Fixed, dec!(500.00), dec!(10.00)),
            MIN_PRICE
        );
        assert_eq!(
            apply_discount(DiscountKind::Percent, dec!(100.00), dec!(10.00)),
            MIN_PRICE
        );
        assert_eq!(
            apply_discount(DiscountKind::SetPrice, dec!(0.00), dec!(10.00)),
            MIN_PRICE
        );
    }

    #[test]
    fn heaviest_discount_wins() {
        let best = pick_best(vec![discount(1, 5), discount(10, 1), discount(5, 9)]).unwrap();
        assert_eq!(best.weight, 10);
    }

    #[test]
    fn weight_ties_go_to_the_latest_end() {
        let later = discount(3, 30);
        let best = pick_best(vec![discount(3, 2), later.clone(), discount(3, 7)]).unwrap();
        assert_eq!(best.id, later.id);
    }

    #[test]
    fn no_candidates_means_no_discount() {
        assert!(pick_best(vec![]).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::{apply_discount, MIN_PRICE};
    use crate::entities::DiscountKind;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    proptest! {
        #[test]
        fn no_discount_drops_a_price_below_one_cent(
            value in 0u32..=100_000u32,
            price_cents in 1i64..=100_000_000i64,
            kind_index in 0usize..3,
        ) {
            let kind = [DiscountKind::Percent, DiscountKind::Fixed, DiscountKind::SetPrice]
                [kind_index];
            let price = Decimal::new(price_cents, 2);
            prop_assert!(apply_discount(kind, Decimal::from(value), price) >= MIN_PRICE);
        }

        #[test]
        fn subtractive_discounts_never_raise_the_price(
            value in 0u32..=100u32,
            price_cents in 1i64..=100_000_000i64,
        ) {
            let price = Decimal::new(price_cents, 2);
            for kind in [DiscountKind::Percent, DiscountKind::Fixed] {
                let result = apply_discount(kind, Decimal::from(value), price);
                prop_assert!(result <= price.max(MIN_PRICE));
            }
        }
    }
}
