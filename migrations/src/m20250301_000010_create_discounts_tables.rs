use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000010_create_discounts_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Discounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Discounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Discounts::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Discounts::Slug)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Discounts::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Discounts::Kind).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Discounts::Value)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Discounts::Weight)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Discounts::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Discounts::StartsAt).timestamp().null())
                    .col(ColumnDef::new(Discounts::EndsAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DiscountProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DiscountProducts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DiscountProducts::DiscountId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscountProducts::ProductId)
                            .uuid()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discount_products_discount_id")
                            .from(DiscountProducts::Table, DiscountProducts::DiscountId)
                            .to(Discounts::Table, Discounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discount_products_product_id")
                            .from(DiscountProducts::Table, DiscountProducts::ProductId)
                            .to(
                                super::m20250301_000002_create_products_table::Products::Table,
                                super::m20250301_000002_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DiscountCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DiscountCategories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DiscountCategories::DiscountId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscountCategories::CategoryId)
                            .uuid()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discount_categories_discount_id")
                            .from(DiscountCategories::Table, DiscountCategories::DiscountId)
                            .to(Discounts::Table, Discounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discount_categories_category_id")
                            .from(DiscountCategories::Table, DiscountCategories::CategoryId)
                            .to(
                                super::m20250301_000001_create_categories_table::Categories::Table,
                                super::m20250301_000001_create_categories_table::Categories::Id,
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
                    .name("idx_discount_products_product_id")
                    .table(DiscountProducts::Table)
                    .col(DiscountProducts::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_discount_categories_category_id")
                    .table(DiscountCategories::Table)
                    .col(DiscountCategories::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DiscountCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DiscountProducts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Discounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Discounts {
    Table,
    Id,
    Name,
    Slug,
    Description,
    Kind,
    Value,
    Weight,
    Active,
    StartsAt,
    EndsAt,
}

#[derive(DeriveIden)]
pub enum DiscountProducts {
    Table,
    Id,
    DiscountId,
    ProductId,
}

#[derive(DeriveIden)]
pub enum DiscountCategories {
    Table,
    Id,
    DiscountId,
    CategoryId,
}
