mod common;

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

use pressroom_api::{
    clock::FixedClock,
    config::RoyaltyConfig,
    errors::ServiceError,
    services::royalties::{PeriodStatus, RoyaltyService},
};

use common::{setup_db, seed_sale};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn service_at(db: Arc<pressroom_api::db::DbPool>, today: NaiveDate) -> RoyaltyService {
    RoyaltyService::new(db, RoyaltyConfig::default(), Arc::new(FixedClock(today)))
}

#[tokio::test]
async fn periods_are_created_once_and_regeneration_adds_nothing() {
    let db = setup_db().await;
    let service = service_at(db.clone(), day(2026, 3, 10));

    let first = service.get_or_create_current_periods().await.unwrap();
    // launch window + January, February, March
    assert_eq!(first.len(), 4);

    let second = service.get_or_create_current_periods().await.unwrap();
    assert!(second.is_empty());

    let dashboard = service.dashboard().await.unwrap();
    assert_eq!(dashboard.periods.len(), 4);
}

#[tokio::test]
async fn launch_period_has_the_fixed_window_and_due_date() {
    let db = setup_db().await;
    let service = service_at(db.clone(), day(2025, 12, 20));

    let created = service.get_or_create_current_periods().await.unwrap();
    assert_eq!(created.len(), 1);

    let launch = &created[0];
    assert_eq!(launch.start_date, day(2025, 12, 16));
    assert_eq!(launch.end_date, day(2025, 12, 31));
    assert_eq!(launch.payment_due_date, day(2026, 2, 28));
    assert_eq!(launch.amount_per_book, dec!(1.00));

    let dashboard = service.dashboard().await.unwrap();
    assert_eq!(dashboard.periods[0].name, "December 2025 (Launch)");
    assert_eq!(dashboard.periods[0].status, PeriodStatus::Pending);
}

#[tokio::test]
async fn monthly_due_dates_follow_two_months_on() {
    let db = setup_db().await;
    let service = service_at(db.clone(), day(2026, 3, 1));

    service.get_or_create_current_periods().await.unwrap();
    let dashboard = service.dashboard().await.unwrap();

    // Newest first: March, February, January, launch
    let names: Vec<&str> = dashboard.periods.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "March 2026",
            "February 2026",
            "January 2026",
            "December 2025 (Launch)"
        ]
    );

    let january = &dashboard.periods[2];
    assert_eq!(january.start_date, day(2026, 1, 1));
    assert_eq!(january.end_date, day(2026, 1, 31));
    assert_eq!(january.payment_due_date, day(2026, 3, 31));
}

#[tokio::test]
async fn books_sold_counts_the_full_launch_window() {
    let db = setup_db().await;

    seed_sale(
        db.as_ref(),
        "#2001",
        Utc.with_ymd_and_hms(2025, 12, 16, 0, 0, 0).unwrap(),
        2,
    )
    .await;
    seed_sale(
        db.as_ref(),
        "#2002",
        Utc.with_ymd_and_hms(2025, 12, 31, 23, 45, 0).unwrap(),
        1,
    )
    .await;
    // The moment midnight passes it belongs to January
    seed_sale(
        db.as_ref(),
        "#2003",
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        5,
    )
    .await;
    // Just before launch day
    seed_sale(
        db.as_ref(),
        "#2004",
        Utc.with_ymd_and_hms(2025, 12, 15, 23, 59, 59).unwrap(),
        7,
    )
    .await;

    let service = service_at(db.clone(), day(2026, 1, 5));
    let dashboard = service.dashboard().await.unwrap();

    let launch = dashboard
        .periods
        .iter()
        .find(|p| p.start_date == day(2025, 12, 16))
        .unwrap();
    assert_eq!(launch.books_sold, 3);
    assert_eq!(launch.total_amount, dec!(3.00));

    let january = dashboard
        .periods
        .iter()
        .find(|p| p.start_date == day(2026, 1, 1))
        .unwrap();
    assert_eq!(january.books_sold, 5);
}

#[tokio::test]
async fn statuses_follow_the_calendar() {
    let db = setup_db().await;
    let service = service_at(db.clone(), day(2026, 3, 1));

    service.get_or_create_current_periods().await.unwrap();
    let dashboard = service.dashboard().await.unwrap();

    let status_of = |start: NaiveDate| {
        dashboard
            .periods
            .iter()
            .find(|p| p.start_date == start)
            .unwrap()
            .status
    };

    // Launch was due 2026-02-28; 1 March is past it
    assert_eq!(status_of(day(2025, 12, 16)), PeriodStatus::Overdue);
    // January closed but is not due until the end of March
    assert_eq!(status_of(day(2026, 1, 1)), PeriodStatus::Due);
    assert_eq!(status_of(day(2026, 2, 1)), PeriodStatus::Due);
    // March is still running
    assert_eq!(status_of(day(2026, 3, 1)), PeriodStatus::Pending);

    assert_eq!(dashboard.overdue_count, 1);
    assert_eq!(dashboard.due_count, 2);
}

#[tokio::test]
async fn paid_survives_regeneration_until_explicitly_unpaid() {
    let db = setup_db().await;
    let service = service_at(db.clone(), day(2026, 3, 1));

    let created = service.get_or_create_current_periods().await.unwrap();
    let launch_id = created
        .iter()
        .find(|p| p.start_date == day(2025, 12, 16))
        .unwrap()
        .id;

    let paid = service.mark_paid(launch_id).await.unwrap();
    assert_eq!(paid.status, PeriodStatus::Paid);
    assert_eq!(paid.paid_date, Some(day(2026, 3, 1)));

    // Regeneration re-evaluates statuses but leaves the payment in place
    service.get_or_create_current_periods().await.unwrap();
    let dashboard = service.dashboard().await.unwrap();
    let launch = dashboard
        .periods
        .iter()
        .find(|p| p.id == launch_id)
        .unwrap();
    assert_eq!(launch.status, PeriodStatus::Paid);

    let unpaid = service.mark_unpaid(launch_id).await.unwrap();
    assert_eq!(unpaid.status, PeriodStatus::Overdue);
    assert_eq!(unpaid.paid_date, None);
}

#[tokio::test]
async fn paid_totals_feed_the_dashboard_summary() {
    let db = setup_db().await;

    seed_sale(
        db.as_ref(),
        "#2005",
        Utc.with_ymd_and_hms(2025, 12, 20, 12, 0, 0).unwrap(),
        4,
    )
    .await;

    let service = service_at(db.clone(), day(2026, 1, 5));
    let created = service.get_or_create_current_periods().await.unwrap();
    let launch_id = created
        .iter()
        .find(|p| p.start_date == day(2025, 12, 16))
        .unwrap()
        .id;

    service.mark_paid(launch_id).await.unwrap();
    let dashboard = service.dashboard().await.unwrap();

    assert_eq!(dashboard.total_books, 4);
    assert_eq!(dashboard.total_amount, dec!(4.00));
    assert_eq!(dashboard.total_paid, dec!(4.00));
    assert_eq!(dashboard.total_outstanding, dec!(0.00));
}

#[tokio::test]
async fn manual_amount_overrides_and_clears() {
    let db = setup_db().await;

    seed_sale(
        db.as_ref(),
        "#2006",
        Utc.with_ymd_and_hms(2025, 12, 20, 12, 0, 0).unwrap(),
        10,
    )
    .await;

    let service = service_at(db.clone(), day(2026, 1, 5));
    let created = service.get_or_create_current_periods().await.unwrap();
    let launch_id = created
        .iter()
        .find(|p| p.start_date == day(2025, 12, 16))
        .unwrap()
        .id;

    let overridden = service
        .set_manual_amount(launch_id, "£25.00")
        .await
        .unwrap();
    assert_eq!(overridden.manual_amount, Some(dec!(25.00)));
    assert_eq!(overridden.total_amount, dec!(25.00));
    assert_eq!(overridden.books_sold, 10);

    let cleared = service.set_manual_amount(launch_id, "AUTO").await.unwrap();
    assert_eq!(cleared.manual_amount, None);
    assert_eq!(cleared.total_amount, dec!(10.00));
}

#[tokio::test]
async fn rejected_amounts_leave_the_stored_override_alone() {
    let db = setup_db().await;

    let service = service_at(db.clone(), day(2026, 1, 5));
    let created = service.get_or_create_current_periods().await.unwrap();
    let launch_id = created
        .iter()
        .find(|p| p.start_date == day(2025, 12, 16))
        .unwrap()
        .id;

    service.set_manual_amount(launch_id, "30").await.unwrap();

    let negative = service.set_manual_amount(launch_id, "-5").await;
    assert!(matches!(negative, Err(ServiceError::ValidationError(_))));

    let garbage = service.set_manual_amount(launch_id, "plenty").await;
    assert!(matches!(garbage, Err(ServiceError::ValidationError(_))));

    let dashboard = service.dashboard().await.unwrap();
    let launch = dashboard
        .periods
        .iter()
        .find(|p| p.id == launch_id)
        .unwrap();
    assert_eq!(launch.manual_amount, Some(dec!(30)));
    assert_eq!(launch.total_amount, dec!(30));
}

#[tokio::test]
async fn unknown_period_ids_are_not_found() {
    let db = setup_db().await;
    let service = service_at(db, day(2026, 1, 5));

    let result = service.mark_paid(uuid::Uuid::new_v4()).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
