//! Sales aggregate for the tracked title.
//!
//! Royalty and analytics figures are computed by pure functions over a list
//! of [`SaleRecord`]s loaded in one query, so the same loaded aggregate
//! serves a whole dashboard render and the math is testable without a store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use sea_orm::EntityTrait;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{line_item::Entity as LineItemEntity, order::Entity as OrderEntity},
    errors::ServiceError,
};

/// One sold line of the tracked title, joined with the order it belongs to.
#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: i32,
    pub order_date: Option<DateTime<Utc>>,
}

/// Case-insensitive substring match used for both title tracking and the
/// pre-order split.
pub fn name_contains(product_name: &str, fragment: &str) -> bool {
    product_name
        .to_lowercase()
        .contains(&fragment.to_lowercase())
}

/// Load every line item whose product name matches `tracked_title`, joined
/// with its owning order.
#[instrument(skip(db))]
pub async fn load_tracked_sales(
    db: &Arc<DbPool>,
    tracked_title: &str,
) -> Result<Vec<SaleRecord>, ServiceError> {
    let rows = LineItemEntity::find()
        .find_also_related(OrderEntity)
        .all(db.as_ref())
        .await?;

    let records = rows
        .into_iter()
        .filter_map(|(item, order)| {
            let order = order?;
            if !name_contains(&item.product_name, tracked_title) {
                return None;
            }
            Some(SaleRecord {
                order_id: order.id,
                order_number: order.order_number,
                customer_name: order.customer_name,
                product_name: item.product_name,
                quantity: item.quantity,
                order_date: order.order_date,
            })
        })
        .collect();

    Ok(records)
}

/// UTC datetime bounds for an inclusive calendar-date range. The upper bound
/// is midnight after `end` so the final day counts in full whatever the
/// time-of-day on the order.
pub fn window_bounds(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let day_start = |d: NaiveDate| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN));
    (day_start(start), day_start(end.succ_opt().unwrap_or(end)))
}

fn in_window(record: &SaleRecord, from: DateTime<Utc>, until: Option<DateTime<Utc>>) -> bool {
    match record.order_date {
        Some(dt) => dt >= from && until.map_or(true, |u| dt < u),
        None => false,
    }
}

/// Units sold in the half-open datetime window `[from, until)`; an absent
/// `until` leaves the window open-ended.
pub fn units_in_window(
    records: &[SaleRecord],
    from: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
) -> i64 {
    records
        .iter()
        .filter(|r| in_window(r, from, until))
        .map(|r| i64::from(r.quantity))
        .sum()
}

/// Units sold across the inclusive calendar-date range `[start, end]`.
pub fn units_between(records: &[SaleRecord], start: NaiveDate, end: NaiveDate) -> i64 {
    let (from, until) = window_bounds(start, end);
    units_in_window(records, from, Some(until))
}

/// Number of distinct orders across the whole aggregate, undated included.
pub fn distinct_orders(records: &[SaleRecord]) -> u64 {
    let mut seen: Vec<Uuid> = records.iter().map(|r| r.order_id).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len() as u64
}

/// Number of distinct orders in the half-open datetime window.
pub fn orders_in_window(
    records: &[SaleRecord],
    from: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
) -> u64 {
    let mut seen: Vec<Uuid> = records
        .iter()
        .filter(|r| in_window(r, from, until))
        .map(|r| r.order_id)
        .collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len() as u64
}

/// Unit totals per calendar day, dated records only, in date order.
pub fn daily_units(records: &[SaleRecord]) -> Vec<(NaiveDate, i64)> {
    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for record in records {
        if let Some(dt) = record.order_date {
            *buckets.entry(dt.date_naive()).or_insert(0) += i64::from(record.quantity);
        }
    }
    buckets.into_iter().collect()
}

/// Unit totals per calendar month (keyed on the first of the month), dated
/// records only, in date order.
pub fn monthly_units(records: &[SaleRecord]) -> Vec<(NaiveDate, i64)> {
    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for record in records {
        if let Some(dt) = record.order_date {
            let date = dt.date_naive();
            if let Some(month_start) = NaiveDate::from_ymd_opt(date.year(), date.month(), 1) {
                *buckets.entry(month_start).or_insert(0) += i64::from(record.quantity);
            }
        }
    }
    buckets.into_iter().collect()
}
