use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentPeriods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentPeriods::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentPeriods::StartDate).date().not_null())
                    .col(ColumnDef::new(PaymentPeriods::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(PaymentPeriods::AmountPerBook)
                            .decimal()
                            .not_null()
                            .default(1.0),
                    )
                    .col(ColumnDef::new(PaymentPeriods::ManualAmount).decimal().null())
                    .col(
                        ColumnDef::new(PaymentPeriods::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(PaymentPeriods::PaymentDueDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentPeriods::PaidDate).date().null())
                    .col(
                        ColumnDef::new(PaymentPeriods::Notes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PaymentPeriods::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentPeriods::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        // Period creation is idempotent on the (start, end) pair
        manager
            .create_index(
                Index::create()
                    .name("idx_payment_periods_range")
                    .table(PaymentPeriods::Table)
                    .col(PaymentPeriods::StartDate)
                    .col(PaymentPeriods::EndDate)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentPeriods::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PaymentPeriods {
    Table,
    Id,
    StartDate,
    EndDate,
    AmountPerBook,
    ManualAmount,
    Status,
    PaymentDueDate,
    PaidDate,
    Notes,
    CreatedAt,
    UpdatedAt,
}
