use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LineItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LineItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LineItems::OrderId).uuid().not_null())
                    .col(ColumnDef::new(LineItems::ProductName).string().not_null())
                    .col(ColumnDef::new(LineItems::Quantity).integer().not_null())
                    .col(ColumnDef::new(LineItems::Sku).string().null())
                    .col(ColumnDef::new(LineItems::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(LineItems::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_line_items_order_id")
                            .from(LineItems::Table, LineItems::OrderId)
                            .to(
                                super::m20251210_000001_create_orders_table::Orders::Table,
                                super::m20251210_000001_create_orders_table::Orders::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Import merges line items by (order, product, sku)
        manager
            .create_index(
                Index::create()
                    .name("idx_line_items_order_product_sku")
                    .table(LineItems::Table)
                    .col(LineItems::OrderId)
                    .col(LineItems::ProductName)
                    .col(LineItems::Sku)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LineItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LineItems {
    Table,
    Id,
    OrderId,
    ProductName,
    Quantity,
    Sku,
    CreatedAt,
    UpdatedAt,
}
