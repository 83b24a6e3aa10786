use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000006_create_properties_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Properties::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Properties::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(Properties::Name).string_len(255).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_properties_category_id")
                            .from(Properties::Table, Properties::CategoryId)
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
            .create_table(
                Table::create()
                    .table(PropertyValues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PropertyValues::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PropertyValues::ProductId).uuid().not_null())
                    .col(ColumnDef::new(PropertyValues::PropertyId).uuid().not_null())
                    .col(
                        ColumnDef::new(PropertyValues::Value)
                            .string_len(255)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_values_product_id")
                            .from(PropertyValues::Table, PropertyValues::ProductId)
                            .to(
                                super::m20250301_000002_create_products_table::Products::Table,
                                super::m20250301_000002_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_values_property_id")
                            .from(PropertyValues::Table, PropertyValues::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_property_values_product_id")
                    .table(PropertyValues::Table)
                    .col(PropertyValues::ProductId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PropertyValues::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Properties {
    Table,
    Id,
    CategoryId,
    Name,
}

#[derive(DeriveIden)]
pub enum PropertyValues {
    Table,
    Id,
    ProductId,
    PropertyId,
    Value,
}
