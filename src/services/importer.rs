use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        line_item::{self, ActiveModel as LineItemActiveModel, Entity as LineItemEntity},
        order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel},
    },
    errors::ServiceError,
};

/// Timestamp format used by the storefront export, e.g. `2025-12-16 14:03:21 +0000`.
const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

const DEFAULT_CURRENCY: &str = "GBP";

/// One row of the storefront order export. Multi-line orders repeat the order
/// fields on every row; only the first row is guaranteed to carry shipping
/// details. Everything arrives as strings.
#[derive(Debug, Deserialize)]
struct ExportRow {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Shipping Name", default)]
    shipping_name: String,
    #[serde(rename = "Shipping Address1", default)]
    shipping_address1: String,
    #[serde(rename = "Shipping Address2", default)]
    shipping_address2: String,
    #[serde(rename = "Shipping City", default)]
    shipping_city: String,
    #[serde(rename = "Shipping Zip", default)]
    shipping_zip: String,
    #[serde(rename = "Subtotal", default)]
    subtotal: String,
    #[serde(rename = "Currency", default)]
    currency: String,
    #[serde(rename = "Fulfillment Status", default)]
    fulfillment_status: String,
    #[serde(rename = "Created at", default)]
    created_at: String,
    #[serde(rename = "Lineitem name", default)]
    lineitem_name: String,
    #[serde(rename = "Lineitem sku", default)]
    lineitem_sku: String,
    #[serde(rename = "Lineitem quantity", default)]
    lineitem_quantity: String,
}

/// Tally of what an import run did.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportSummary {
    pub orders_created: u64,
    pub orders_updated: u64,
    pub items_created: u64,
    pub items_merged: u64,
    pub rows_skipped: u64,
}

/// Reconciles storefront CSV exports into orders and line items.
///
/// Re-running an import is intentionally quantity-additive: a repeated row
/// for an existing (order, product, sku) adds its quantity to the stored
/// line item. That merges multi-row exports correctly, and equally means
/// importing the same file twice doubles quantities.
#[derive(Clone)]
pub struct ImportService {
    db: Arc<DbPool>,
}

impl ImportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Import an export file. A missing file is a reported error; malformed
    /// rows and fields degrade rather than aborting the run.
    #[instrument(skip(self))]
    pub async fn import_file(&self, path: &Path) -> Result<ImportSummary, ServiceError> {
        if !path.exists() {
            return Err(ServiceError::ImportError(format!(
                "CSV file not found: {}",
                path.display()
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(|e| ServiceError::ImportError(format!("Failed to open CSV: {e}")))?;

        let mut summary = ImportSummary::default();

        for row in reader.deserialize::<ExportRow>() {
            match row {
                Ok(row) => self.apply_row(row, &mut summary).await?,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable CSV row");
                    summary.rows_skipped += 1;
                }
            }
        }

        info!(
            orders_created = summary.orders_created,
            orders_updated = summary.orders_updated,
            items_created = summary.items_created,
            items_merged = summary.items_merged,
            rows_skipped = summary.rows_skipped,
            "Import finished"
        );

        Ok(summary)
    }

    async fn apply_row(
        &self,
        row: ExportRow,
        summary: &mut ImportSummary,
    ) -> Result<(), ServiceError> {
        if row.name.is_empty() {
            summary.rows_skipped += 1;
            return Ok(());
        }

        let order = match self.find_order(&row.name).await? {
            Some(existing) => self.backfill_order(existing, &row, summary).await?,
            None => self.create_order(&row, summary).await?,
        };

        self.upsert_line_item(&order, &row, summary).await
    }

    async fn find_order(&self, order_number: &str) -> Result<Option<OrderModel>, ServiceError> {
        Ok(OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(self.db.as_ref())
            .await?)
    }

    async fn create_order(
        &self,
        row: &ExportRow,
        summary: &mut ImportSummary,
    ) -> Result<OrderModel, ServiceError> {
        let currency = if row.currency.is_empty() {
            DEFAULT_CURRENCY.to_string()
        } else {
            row.currency.clone()
        };

        let model = OrderActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(row.name.clone()),
            customer_name: Set(row.shipping_name.clone()),
            shipping_address: Set(compose_address(row)),
            subtotal: Set(parse_subtotal(&row.subtotal)),
            currency: Set(currency),
            is_fulfilled: Set(row.fulfillment_status == "fulfilled"),
            is_packed: Set(false),
            order_date: Set(parse_order_date(&row.created_at)),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        summary.orders_created += 1;
        Ok(model)
    }

    /// Later rows of a multi-row order can supply details the first row
    /// lacked. Only empty shipping fields and a zero subtotal are filled in;
    /// values already present are never overwritten.
    async fn backfill_order(
        &self,
        existing: OrderModel,
        row: &ExportRow,
        summary: &mut ImportSummary,
    ) -> Result<OrderModel, ServiceError> {
        let fill_shipping = existing.customer_name.is_empty() && !row.shipping_name.is_empty();

        let row_subtotal = parse_subtotal(&row.subtotal);
        let fill_subtotal = existing.subtotal.is_zero() && !row_subtotal.is_zero();

        if !fill_shipping && !fill_subtotal {
            return Ok(existing);
        }

        let mut active: OrderActiveModel = existing.into();
        if fill_shipping {
            active.customer_name = Set(row.shipping_name.clone());
            active.shipping_address = Set(compose_address(row));
        }
        if fill_subtotal {
            active.subtotal = Set(row_subtotal);
        }

        let updated = active.update(self.db.as_ref()).await?;
        summary.orders_updated += 1;
        Ok(updated)
    }

    async fn upsert_line_item(
        &self,
        order: &OrderModel,
        row: &ExportRow,
        summary: &mut ImportSummary,
    ) -> Result<(), ServiceError> {
        if row.lineitem_name.is_empty() {
            return Ok(());
        }

        let sku = if row.lineitem_sku.is_empty() {
            None
        } else {
            Some(row.lineitem_sku.clone())
        };

        let mut query = LineItemEntity::find()
            .filter(line_item::Column::OrderId.eq(order.id))
            .filter(line_item::Column::ProductName.eq(row.lineitem_name.clone()));
        query = match &sku {
            Some(s) => query.filter(line_item::Column::Sku.eq(s.clone())),
            None => query.filter(line_item::Column::Sku.is_null()),
        };

        let quantity = parse_quantity(&row.lineitem_quantity);

        match query.one(self.db.as_ref()).await? {
            Some(existing) => {
                let merged = existing.quantity + quantity;
                let mut active: LineItemActiveModel = existing.into();
                active.quantity = Set(merged);
                active.update(self.db.as_ref()).await?;
                summary.items_merged += 1;
            }
            None => {
                LineItemActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order.id),
                    product_name: Set(row.lineitem_name.clone()),
                    quantity: Set(quantity),
                    sku: Set(sku),
                    ..Default::default()
                }
                .insert(self.db.as_ref())
                .await?;
                summary.items_created += 1;
            }
        }

        Ok(())
    }

    /// Set `order_date` to the ingestion timestamp for orders that never got
    /// a storefront date. Returns how many orders were touched.
    #[instrument(skip(self))]
    pub async fn backfill_order_dates(&self) -> Result<u64, ServiceError> {
        let undated = OrderEntity::find()
            .filter(order::Column::OrderDate.is_null())
            .all(self.db.as_ref())
            .await?;

        let mut touched = 0;
        for order in undated {
            let created_at = order.created_at;
            let order_number = order.order_number.clone();
            let mut active: OrderActiveModel = order.into();
            active.order_date = Set(Some(created_at));
            active.update(self.db.as_ref()).await?;
            info!(order_number = %order_number, "Backfilled order date from ingestion time");
            touched += 1;
        }

        Ok(touched)
    }
}

fn compose_address(row: &ExportRow) -> String {
    format!(
        "{} {} {} {}",
        row.shipping_address1, row.shipping_address2, row.shipping_city, row.shipping_zip
    )
    .trim()
    .to_string()
}

fn parse_subtotal(raw: &str) -> Decimal {
    raw.trim().parse().unwrap_or(Decimal::ZERO)
}

/// Quantities arrive as "1", "2.0", or garbage; fall back to a single unit
/// rather than dropping the row.
fn parse_quantity(raw: &str) -> i32 {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i32>() {
        return n;
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return f as i32;
    }
    1
}

fn parse_order_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw.trim(), EXPORT_DATE_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
