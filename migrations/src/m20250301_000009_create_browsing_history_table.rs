use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000009_create_browsing_history_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BrowsingHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BrowsingHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BrowsingHistory::UserId).uuid().not_null())
                    .col(ColumnDef::new(BrowsingHistory::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(BrowsingHistory::ViewedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_browsing_history_product_id")
                            .from(BrowsingHistory::Table, BrowsingHistory::ProductId)
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
            .create_index(
                Index::create()
                    .name("idx_browsing_history_user_product")
                    .table(BrowsingHistory::Table)
                    .col(BrowsingHistory::UserId)
                    .col(BrowsingHistory::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BrowsingHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BrowsingHistory {
    Table,
    Id,
    UserId,
    ProductId,
    ViewedAt,
}
