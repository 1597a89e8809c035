mod common;

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use pressroom_api::{
    clock::FixedClock,
    config::RoyaltyConfig,
    services::analytics::{AnalyticsService, ReportWindow, SaleKind},
};

use common::{seed_line_item, seed_order, setup_db};

async fn seed_fixture(db: &pressroom_api::db::DbPool) {
    let sales = [
        ("#4001", 2026, 1, 10, "Through Bear's Eyes", 2),
        ("#4002", 2026, 1, 15, "Through Bear's Eyes (Pre-Order)", 1),
        ("#4003", 2025, 12, 20, "Through Bear's Eyes", 4),
        ("#4004", 2025, 11, 1, "Through Bear's Eyes", 1),
    ];
    for (number, y, m, d, product, qty) in sales {
        let order = seed_order(
            db,
            number,
            Some(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()),
        )
        .await;
        seed_line_item(db, order.id, product, qty).await;
    }

    // Unrelated merchandise never shows up in the report
    let other = seed_order(
        db,
        "#4005",
        Some(Utc.with_ymd_and_hms(2026, 1, 12, 12, 0, 0).unwrap()),
    )
    .await;
    seed_line_item(db, other.id, "Tote Bag", 3).await;
}

fn service_at(db: Arc<pressroom_api::db::DbPool>, today: NaiveDate) -> AnalyticsService {
    AnalyticsService::new(db, RoyaltyConfig::default(), Arc::new(FixedClock(today)))
}

#[tokio::test]
async fn month_report_compares_against_the_previous_thirty_days() {
    let db = setup_db().await;
    seed_fixture(db.as_ref()).await;

    let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let report = service_at(db, today)
        .sales_report(ReportWindow::Month, SaleKind::All)
        .await
        .unwrap();

    // Current window opens 2026-01-02; the December sale falls in the
    // previous window and November in neither
    assert_eq!(report.current.books_sold, 3);
    assert_eq!(report.current.orders, 2);
    assert_eq!(report.current.qty_change, -25.0);
    assert_eq!(report.current.order_change, 100.0);

    assert_eq!(report.all_time.books_sold, 8);
    assert_eq!(report.all_time.orders, 4);

    assert_eq!(report.breakdown.preorder, 1);
    assert_eq!(report.breakdown.regular, 7);
}

#[tokio::test]
async fn month_chart_buckets_by_day() {
    let db = setup_db().await;
    seed_fixture(db.as_ref()).await;

    let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let report = service_at(db, today)
        .sales_report(ReportWindow::Month, SaleKind::All)
        .await
        .unwrap();

    let points: Vec<(&str, i64)> = report
        .chart
        .iter()
        .map(|p| (p.label.as_str(), p.value))
        .collect();
    assert_eq!(points, vec![("10 Jan", 2), ("15 Jan", 1)]);
}

#[tokio::test]
async fn recent_sales_run_newest_first_with_preorder_flags() {
    let db = setup_db().await;
    seed_fixture(db.as_ref()).await;

    let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let report = service_at(db, today)
        .sales_report(ReportWindow::Month, SaleKind::All)
        .await
        .unwrap();

    assert_eq!(report.recent_sales.len(), 2);
    assert_eq!(report.recent_sales[0].order_number, "#4002");
    assert!(report.recent_sales[0].is_preorder);
    assert_eq!(report.recent_sales[0].date, "15 Jan 2026 12:00");
    assert_eq!(report.recent_sales[1].order_number, "#4001");
    assert!(!report.recent_sales[1].is_preorder);
}

#[tokio::test]
async fn preorder_filter_narrows_current_and_all_time_figures() {
    let db = setup_db().await;
    seed_fixture(db.as_ref()).await;

    let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let report = service_at(db, today)
        .sales_report(ReportWindow::Month, SaleKind::Preorder)
        .await
        .unwrap();

    assert_eq!(report.current.books_sold, 1);
    assert_eq!(report.all_time.books_sold, 1);
    // The breakdown always shows the whole split
    assert_eq!(report.breakdown.regular, 7);

    // An empty previous window reads as no change
    assert_eq!(report.current.qty_change, 0.0);
}

#[tokio::test]
async fn year_report_buckets_by_month() {
    let db = setup_db().await;
    seed_fixture(db.as_ref()).await;

    let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let report = service_at(db, today)
        .sales_report(ReportWindow::Year, SaleKind::All)
        .await
        .unwrap();

    let points: Vec<(&str, i64)> = report
        .chart
        .iter()
        .map(|p| (p.label.as_str(), p.value))
        .collect();
    assert_eq!(
        points,
        vec![("Nov 2025", 1), ("Dec 2025", 4), ("Jan 2026", 3)]
    );
}
