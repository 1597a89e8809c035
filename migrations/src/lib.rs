pub use sea_orm_migration::prelude::*;

mod m20251210_000001_create_orders_table;
mod m20251210_000002_create_line_items_table;
mod m20251214_000003_create_payment_periods_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251210_000001_create_orders_table::Migration),
            Box::new(m20251210_000002_create_line_items_table::Migration),
            Box::new(m20251214_000003_create_payment_periods_table::Migration),
        ]
    }
}
