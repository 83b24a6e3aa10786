pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_categories_table;
mod m20250301_000002_create_products_table;
mod m20250301_000003_create_tags_tables;
mod m20250301_000004_create_sellers_table;
mod m20250301_000005_create_seller_offers_table;
mod m20250301_000006_create_properties_tables;
mod m20250301_000007_create_reviews_table;
mod m20250301_000008_create_cart_items_table;
mod m20250301_000009_create_browsing_history_table;
mod m20250301_000010_create_discounts_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_categories_table::Migration),
            Box::new(m20250301_000002_create_products_table::Migration),
            Box::new(m20250301_000003_create_tags_tables::Migration),
            Box::new(m20250301_000004_create_sellers_table::Migration),
            Box::new(m20250301_000005_create_seller_offers_table::Migration),
            Box::new(m20250301_000006_create_properties_tables::Migration),
            Box::new(m20250301_000007_create_reviews_table::Migration),
            Box::new(m20250301_000008_create_cart_items_table::Migration),
            Box::new(m20250301_000009_create_browsing_history_table::Migration),
            Box::new(m20250301_000010_create_discounts_tables::Migration),
        ]
    }
}
