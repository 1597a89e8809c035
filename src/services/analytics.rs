use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    clock::SharedClock,
    config::RoyaltyConfig,
    db::DbPool,
    errors::ServiceError,
    services::sales::{self, SaleRecord},
};

const RECENT_SALES_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportWindow {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SaleKind {
    #[default]
    All,
    Preorder,
    Regular,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentStats {
    pub books_sold: i64,
    pub orders: u64,
    pub qty_change: f64,
    pub order_change: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AllTimeStats {
    pub books_sold: i64,
    pub orders: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaleBreakdown {
    pub preorder: i64,
    pub regular: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChartPoint {
    pub label: String,
    pub value: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentSale {
    pub order_number: String,
    pub customer: String,
    pub product: String,
    pub quantity: i32,
    pub date: String,
    pub is_preorder: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SalesReport {
    pub period: ReportWindow,
    pub order_type: SaleKind,
    pub current: CurrentStats,
    pub all_time: AllTimeStats,
    pub breakdown: SaleBreakdown,
    pub chart: Vec<ChartPoint>,
    pub recent_sales: Vec<RecentSale>,
}

/// Percent delta between two window totals, one decimal place. An empty
/// previous window reads as no change rather than a division blow-up.
pub fn percent_change(current: i64, previous: i64) -> f64 {
    if previous <= 0 {
        return 0.0;
    }
    let raw = (current - previous) as f64 / previous as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Current-window start and previous-window range for a report window, all
/// as calendar dates relative to `today`.
fn window_dates(window: ReportWindow, today: NaiveDate) -> (NaiveDate, NaiveDate, NaiveDate) {
    let back = |days: u64| today.checked_sub_days(Days::new(days)).unwrap_or(today);
    match window {
        ReportWindow::Day => (today, back(1), today),
        ReportWindow::Week => (back(7), back(14), back(7)),
        ReportWindow::Month => (back(30), back(60), back(30)),
        ReportWindow::Year => (back(365), back(730), back(365)),
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Read-only sales reporting over the tracked title.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DbPool>,
    config: RoyaltyConfig,
    clock: SharedClock,
}

impl AnalyticsService {
    pub fn new(db: Arc<DbPool>, config: RoyaltyConfig, clock: SharedClock) -> Self {
        Self { db, config, clock }
    }

    fn kind_of(&self, record: &SaleRecord) -> SaleKind {
        if sales::name_contains(&record.product_name, &self.config.preorder_marker) {
            SaleKind::Preorder
        } else {
            SaleKind::Regular
        }
    }

    fn matches_kind(&self, record: &SaleRecord, kind: SaleKind) -> bool {
        match kind {
            SaleKind::All => true,
            kind => self.kind_of(record) == kind,
        }
    }

    #[instrument(skip(self))]
    pub async fn sales_report(
        &self,
        window: ReportWindow,
        kind: SaleKind,
    ) -> Result<SalesReport, ServiceError> {
        let records = sales::load_tracked_sales(&self.db, &self.config.tracked_title).await?;
        let today = self.clock.today();

        let (start, prev_start, prev_end) = window_dates(window, today);
        let current_from = day_start(start);

        let filtered: Vec<SaleRecord> = records
            .iter()
            .filter(|r| self.matches_kind(r, kind))
            .cloned()
            .collect();

        let current_qty = sales::units_in_window(&filtered, current_from, None);
        let current_orders = sales::orders_in_window(&filtered, current_from, None);
        let prev_qty = sales::units_in_window(
            &filtered,
            day_start(prev_start),
            Some(day_start(prev_end)),
        );
        let prev_orders = sales::orders_in_window(
            &filtered,
            day_start(prev_start),
            Some(day_start(prev_end)),
        );

        let all_time_qty: i64 = filtered.iter().map(|r| i64::from(r.quantity)).sum();
        let all_time_orders = sales::distinct_orders(&filtered);

        let preorder_total: i64 = records
            .iter()
            .filter(|r| self.kind_of(r) == SaleKind::Preorder)
            .map(|r| i64::from(r.quantity))
            .sum();
        let regular_total: i64 = records
            .iter()
            .filter(|r| self.kind_of(r) == SaleKind::Regular)
            .map(|r| i64::from(r.quantity))
            .sum();

        let in_current: Vec<SaleRecord> = filtered
            .iter()
            .filter(|r| r.order_date.is_some_and(|dt| dt >= current_from))
            .cloned()
            .collect();

        let chart = self.chart_series(window, today, current_qty, &in_current);
        let recent_sales = self.recent_sales(in_current);

        Ok(SalesReport {
            period: window,
            order_type: kind,
            current: CurrentStats {
                books_sold: current_qty,
                orders: current_orders,
                qty_change: percent_change(current_qty, prev_qty),
                order_change: percent_change(current_orders as i64, prev_orders as i64),
            },
            all_time: AllTimeStats {
                books_sold: all_time_qty,
                orders: all_time_orders,
            },
            breakdown: SaleBreakdown {
                preorder: preorder_total,
                regular: regular_total,
            },
            chart,
            recent_sales,
        })
    }

    fn chart_series(
        &self,
        window: ReportWindow,
        today: NaiveDate,
        current_qty: i64,
        in_current: &[SaleRecord],
    ) -> Vec<ChartPoint> {
        match window {
            // No hourly resolution in the store; a single bucket for today
            ReportWindow::Day => vec![ChartPoint {
                label: today.format("%d %b").to_string(),
                value: current_qty,
            }],
            ReportWindow::Week => sales::daily_units(in_current)
                .into_iter()
                .map(|(date, value)| ChartPoint {
                    label: date.format("%a %d").to_string(),
                    value,
                })
                .collect(),
            ReportWindow::Month => sales::daily_units(in_current)
                .into_iter()
                .map(|(date, value)| ChartPoint {
                    label: date.format("%d %b").to_string(),
                    value,
                })
                .collect(),
            ReportWindow::Year => sales::monthly_units(in_current)
                .into_iter()
                .map(|(month, value)| ChartPoint {
                    label: month.format("%b %Y").to_string(),
                    value,
                })
                .collect(),
        }
    }

    fn recent_sales(&self, mut in_current: Vec<SaleRecord>) -> Vec<RecentSale> {
        in_current.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        in_current
            .into_iter()
            .take(RECENT_SALES_LIMIT)
            .map(|r| RecentSale {
                is_preorder: self.kind_of(&r) == SaleKind::Preorder,
                date: r
                    .order_date
                    .map(|dt| dt.format("%d %b %Y %H:%M").to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
                order_number: r.order_number,
                customer: r.customer_name,
                product: r.product_name,
                quantity: r.quantity,
            })
            .collect()
    }
}
