use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product entity for the catalog.
///
/// `count_sells` is a denormalized purchase counter used for popularity
/// sorting. `archived` products are invisible everywhere in the shop.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub count_sells: i32,
    pub archived: bool,
    pub sort_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::seller_offer::Entity")]
    SellerOffers,
    #[sea_orm(has_many = "super::property_value::Entity")]
    PropertyValues,
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::product_tag::Entity")]
    ProductTags,
    #[sea_orm(has_many = "super::browsing_history::Entity")]
    BrowsingHistory,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::seller_offer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SellerOffers.def()
    }
}

impl Related<super::property_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PropertyValues.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_tag::Relation::Tag.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::product_tag::Relation::Product.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
