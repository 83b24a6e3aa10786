use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000003_create_tags_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tags::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Tags::Slug)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductTags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductTags::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductTags::ProductId).uuid().not_null())
                    .col(ColumnDef::new(ProductTags::TagId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_tags_product_id")
                            .from(ProductTags::Table, ProductTags::ProductId)
                            .to(
                                super::m20250301_000002_create_products_table::Products::Table,
                                super::m20250301_000002_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_tags_tag_id")
                            .from(ProductTags::Table, ProductTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_tags_product_tag")
                    .table(ProductTags::Table)
                    .col(ProductTags::ProductId)
                    .col(ProductTags::TagId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Tags {
    Table,
    Id,
    Name,
    Slug,
}

#[derive(DeriveIden)]
pub enum ProductTags {
    Table,
    Id,
    ProductId,
    TagId,
}
