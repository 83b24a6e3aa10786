use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// How a discount transforms the base price.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Subtract `value` percent of the base price.
    #[sea_orm(string_value = "percent")]
    Percent,
    /// Subtract `value` currency units from the base price.
    #[sea_orm(string_value = "fixed")]
    Fixed,
    /// Replace the base price with `value`.
    #[sea_orm(string_value = "set_price")]
    SetPrice,
}

/// A promotion attached to products or whole categories.
///
/// A discount is current when it is active, has not ended, and either has
/// no start date or has already started. When several current discounts
/// touch one product, the heaviest `weight` wins, ties going to the one
/// ending latest.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "discounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub kind: DiscountKind,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub value: Decimal,
    pub weight: i32,
    pub active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::discount_product::Entity")]
    DiscountProducts,
    #[sea_orm(has_many = "super::discount_category::Entity")]
    DiscountCategories,
}

impl Related<super::discount_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiscountProducts.def()
    }
}

impl Related<super::discount_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiscountCategories.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        super::discount_product::Relation::Product.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::discount_product::Relation::Discount.def().rev())
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::discount_category::Relation::Category.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::discount_category::Relation::Discount.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True when the discount applies at `now`.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.active && self.ends_at >= now && self.starts_at.map_or(true, |s| s <= now)
    }
}

impl Entity {
    /// Query condition selecting discounts that are live right now, the
    /// query-side twin of [`Model::is_current`].
    pub fn currently_live() -> sea_orm::Condition {
        use sea_orm::Condition;

        let now = Utc::now();
        Condition::all()
            .add(Column::Active.eq(true))
            .add(Column::EndsAt.gte(now))
            .add(
                Condition::any()
                    .add(Column::StartsAt.is_null())
                    .add(Column::StartsAt.lte(now)),
            )
    }
}
