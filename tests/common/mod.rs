#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use uuid::Uuid;

use pressroom_api::{
    db::{self, DbPool},
    entities::{line_item, order},
};

/// Fresh in-memory SQLite database with the real migrations applied. A single
/// pooled connection keeps the in-memory database alive for the whole test.
pub async fn setup_db() -> Arc<DbPool> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("connect to in-memory sqlite");
    db::run_migrations(&db).await.expect("run migrations");

    Arc::new(db)
}

pub async fn seed_order(
    db: &DbPool,
    order_number: &str,
    order_date: Option<DateTime<Utc>>,
) -> order::Model {
    order::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number.to_string()),
        customer_name: Set("A Reader".to_string()),
        shipping_address: Set("1 High Street Leeds LS1 1AA".to_string()),
        subtotal: Set(Decimal::new(1499, 2)),
        currency: Set("GBP".to_string()),
        is_fulfilled: Set(false),
        is_packed: Set(false),
        order_date: Set(order_date),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert order")
}

pub async fn seed_line_item(
    db: &DbPool,
    order_id: Uuid,
    product_name: &str,
    quantity: i32,
) -> line_item::Model {
    line_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        product_name: Set(product_name.to_string()),
        quantity: Set(quantity),
        sku: Set(Some("TBE-HB".to_string())),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert line item")
}

/// Seed an order carrying `quantity` copies of the tracked title at the given
/// storefront timestamp.
pub async fn seed_sale(
    db: &DbPool,
    order_number: &str,
    order_date: DateTime<Utc>,
    quantity: i32,
) -> order::Model {
    let order = seed_order(db, order_number, Some(order_date)).await;
    seed_line_item(db, order.id, "Through Bear's Eyes", quantity).await;
    order
}
