use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000005_create_seller_offers_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SellerOffers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SellerOffers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SellerOffers::ProductId).uuid().not_null())
                    .col(ColumnDef::new(SellerOffers::SellerId).uuid().not_null())
                    .col(
                        ColumnDef::new(SellerOffers::Price)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SellerOffers::Count)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seller_offers_product_id")
                            .from(SellerOffers::Table, SellerOffers::ProductId)
                            .to(
                                super::m20250301_000002_create_products_table::Products::Table,
                                super::m20250301_000002_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seller_offers_seller_id")
                            .from(SellerOffers::Table, SellerOffers::SellerId)
                            .to(
                                super::m20250301_000004_create_sellers_table::Sellers::Table,
                                super::m20250301_000004_create_sellers_table::Sellers::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_seller_offers_product_id")
                    .table(SellerOffers::Table)
                    .col(SellerOffers::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_seller_offers_product_seller")
                    .table(SellerOffers::Table)
                    .col(SellerOffers::ProductId)
                    .col(SellerOffers::SellerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SellerOffers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SellerOffers {
    Table,
    Id,
    ProductId,
    SellerId,
    Price,
    Count,
}
