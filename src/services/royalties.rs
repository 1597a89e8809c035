use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    clock::SharedClock,
    config::RoyaltyConfig,
    db::DbPool,
    entities::payment_period::{
        self, ActiveModel as PeriodActiveModel, Entity as PeriodEntity, Model as PeriodModel,
    },
    errors::ServiceError,
    services::sales::{self, SaleRecord},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    Pending,
    Due,
    Paid,
    Overdue,
}

/// A period the schedule says should exist: inclusive date range plus the
/// payment deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSpec {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub due: NaiveDate,
}

/// One period as shown on the payments dashboard, with derived figures.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PeriodView {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: PeriodStatus,
    pub amount_per_book: Decimal,
    pub manual_amount: Option<Decimal>,
    pub books_sold: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentsDashboard {
    pub periods: Vec<PeriodView>,
    pub total_books: i64,
    pub total_amount: Decimal,
    pub total_paid: Decimal,
    pub total_outstanding: Decimal,
    pub overdue_count: u64,
    pub due_count: u64,
}

/// Last calendar day of the given month.
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .expect("month arithmetic stays in range")
}

fn month_after(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Due date for a regular monthly period: the last day of the month two
/// months on, rolling the year when the month index runs past December.
fn due_date_for_month(year: i32, month: u32) -> NaiveDate {
    let mut due_month = month + 2;
    let mut due_year = year;
    if due_month > 12 {
        due_month -= 12;
        due_year += 1;
    }
    last_day_of_month(due_year, due_month)
}

/// The full period schedule from launch through `today`.
///
/// The launch window is special-cased: it starts mid-month on the configured
/// launch day, runs to the end of that month, and carries a fixed negotiated
/// due date. Every later period is a whole calendar month, included while its
/// first day is on or before `today`.
pub fn build_schedule(royalty: &RoyaltyConfig, today: NaiveDate) -> Vec<PeriodSpec> {
    let launch = royalty.launch_start;
    let mut specs = vec![PeriodSpec {
        start: launch,
        end: last_day_of_month(launch.year(), launch.month()),
        due: royalty.launch_due,
    }];

    let (mut year, mut month) = month_after(launch.year(), launch.month());
    while NaiveDate::from_ymd_opt(year, month, 1).is_some_and(|first| first <= today) {
        specs.push(PeriodSpec {
            start: NaiveDate::from_ymd_opt(year, month, 1).expect("first of month"),
            end: last_day_of_month(year, month),
            due: due_date_for_month(year, month),
        });
        (year, month) = month_after(year, month);
    }

    specs
}

/// Status for a period as of `today`. A recorded payment wins outright;
/// otherwise the period is overdue past its deadline, due once its range has
/// closed, and pending while still open.
pub fn evaluate_status(
    paid_date: Option<NaiveDate>,
    payment_due_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> PeriodStatus {
    if paid_date.is_some() {
        PeriodStatus::Paid
    } else if today > payment_due_date {
        PeriodStatus::Overdue
    } else if today > end_date {
        PeriodStatus::Due
    } else {
        PeriodStatus::Pending
    }
}

/// Parse a user-supplied override amount. Empty input or the literal `auto`
/// (any case) clears the override; otherwise a leading pound sign is stripped
/// and the rest must parse as a non-negative decimal.
pub fn parse_manual_amount(input: &str) -> Result<Option<Decimal>, ServiceError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }

    let cleaned = trimmed.trim_start_matches('£').trim();
    let amount: Decimal = cleaned.parse().map_err(|_| {
        ServiceError::ValidationError(format!("'{trimmed}' is not a valid amount"))
    })?;

    if amount.is_sign_negative() {
        return Err(ServiceError::ValidationError(
            "Amount cannot be negative".to_string(),
        ));
    }

    Ok(Some(amount))
}

/// Amount owed for a period: the manual override when present, otherwise
/// units sold times the per-book rate.
pub fn total_amount(books_sold: i64, amount_per_book: Decimal, manual: Option<Decimal>) -> Decimal {
    manual.unwrap_or_else(|| Decimal::from(books_sold) * amount_per_book)
}

/// Royalty period bookkeeping over the payment_periods table.
#[derive(Clone)]
pub struct RoyaltyService {
    db: Arc<DbPool>,
    config: RoyaltyConfig,
    clock: SharedClock,
}

impl RoyaltyService {
    pub fn new(db: Arc<DbPool>, config: RoyaltyConfig, clock: SharedClock) -> Self {
        Self { db, config, clock }
    }

    fn period_name(&self, start: NaiveDate) -> String {
        if start == self.config.launch_start {
            format!("{} (Launch)", start.format("%B %Y"))
        } else {
            start.format("%B %Y").to_string()
        }
    }

    /// Ensure a period row exists for every schedule entry up to today, then
    /// re-evaluate status on all periods. Existing rows are left untouched so
    /// a recorded payment or manual amount survives regeneration. Returns the
    /// rows created by this call.
    #[instrument(skip(self))]
    pub async fn get_or_create_current_periods(&self) -> Result<Vec<PeriodModel>, ServiceError> {
        let today = self.clock.today();
        let mut created = Vec::new();

        for spec in build_schedule(&self.config, today) {
            let existing = PeriodEntity::find()
                .filter(payment_period::Column::StartDate.eq(spec.start))
                .filter(payment_period::Column::EndDate.eq(spec.end))
                .one(self.db.as_ref())
                .await?;

            if existing.is_none() {
                let model = PeriodActiveModel {
                    id: Set(Uuid::new_v4()),
                    start_date: Set(spec.start),
                    end_date: Set(spec.end),
                    amount_per_book: Set(self.config.amount_per_book),
                    manual_amount: Set(None),
                    status: Set(PeriodStatus::Pending.to_string()),
                    payment_due_date: Set(spec.due),
                    paid_date: Set(None),
                    notes: Set(String::new()),
                    ..Default::default()
                }
                .insert(self.db.as_ref())
                .await?;

                info!(start = %model.start_date, end = %model.end_date, "Payment period created");
                created.push(model);
            }
        }

        self.refresh_statuses().await?;

        Ok(created)
    }

    /// Re-run the status rules for every stored period.
    async fn refresh_statuses(&self) -> Result<(), ServiceError> {
        let today = self.clock.today();

        for period in PeriodEntity::find().all(self.db.as_ref()).await? {
            let next = evaluate_status(
                period.paid_date,
                period.payment_due_date,
                period.end_date,
                today,
            );
            if period.status != next.to_string() {
                let mut active: PeriodActiveModel = period.into();
                active.status = Set(next.to_string());
                active.update(self.db.as_ref()).await?;
            }
        }

        Ok(())
    }

    /// Everything the payments dashboard needs in one shot: periods
    /// newest-first with derived figures, plus the headline totals.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<PaymentsDashboard, ServiceError> {
        self.get_or_create_current_periods().await?;

        let records = sales::load_tracked_sales(&self.db, &self.config.tracked_title).await?;
        let periods = PeriodEntity::find()
            .order_by_desc(payment_period::Column::StartDate)
            .all(self.db.as_ref())
            .await?;

        let views: Vec<PeriodView> = periods
            .into_iter()
            .map(|p| self.view_of(p, &records))
            .collect();

        let total_books = views.iter().map(|v| v.books_sold).sum();
        let total_amount: Decimal = views.iter().map(|v| v.total_amount).sum();
        let total_paid: Decimal = views
            .iter()
            .filter(|v| v.status == PeriodStatus::Paid)
            .map(|v| v.total_amount)
            .sum();

        Ok(PaymentsDashboard {
            total_books,
            total_amount,
            total_paid,
            total_outstanding: total_amount - total_paid,
            overdue_count: views
                .iter()
                .filter(|v| v.status == PeriodStatus::Overdue)
                .count() as u64,
            due_count: views
                .iter()
                .filter(|v| v.status == PeriodStatus::Due)
                .count() as u64,
            periods: views,
        })
    }

    fn view_of(&self, period: PeriodModel, records: &[SaleRecord]) -> PeriodView {
        let books_sold = sales::units_between(records, period.start_date, period.end_date);
        PeriodView {
            id: period.id,
            name: self.period_name(period.start_date),
            start_date: period.start_date,
            end_date: period.end_date,
            payment_due_date: period.payment_due_date,
            paid_date: period.paid_date,
            status: period
                .status
                .parse()
                .unwrap_or(PeriodStatus::Pending),
            amount_per_book: period.amount_per_book,
            manual_amount: period.manual_amount,
            books_sold,
            total_amount: total_amount(books_sold, period.amount_per_book, period.manual_amount),
        }
    }

    async fn find_period(&self, id: Uuid) -> Result<PeriodModel, ServiceError> {
        PeriodEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment period {id} not found")))
    }

    /// Record payment today. Paid is terminal until explicitly unpaid.
    #[instrument(skip(self), fields(period_id = %id))]
    pub async fn mark_paid(&self, id: Uuid) -> Result<PeriodView, ServiceError> {
        let period = self.find_period(id).await?;

        let mut active: PeriodActiveModel = period.into();
        active.paid_date = Set(Some(self.clock.today()));
        active.status = Set(PeriodStatus::Paid.to_string());
        let updated = active.update(self.db.as_ref()).await?;

        info!(start = %updated.start_date, "Payment period marked paid");
        self.refreshed_view(updated).await
    }

    /// Clear the recorded payment and fall back to the date-derived status.
    #[instrument(skip(self), fields(period_id = %id))]
    pub async fn mark_unpaid(&self, id: Uuid) -> Result<PeriodView, ServiceError> {
        let period = self.find_period(id).await?;

        let next = evaluate_status(
            None,
            period.payment_due_date,
            period.end_date,
            self.clock.today(),
        );

        let mut active: PeriodActiveModel = period.into();
        active.paid_date = Set(None);
        active.status = Set(next.to_string());
        let updated = active.update(self.db.as_ref()).await?;

        info!(start = %updated.start_date, status = %updated.status, "Payment period marked unpaid");
        self.refreshed_view(updated).await
    }

    /// Apply a manual amount override from raw user input. Rejected input
    /// leaves the stored amount untouched.
    #[instrument(skip(self, input), fields(period_id = %id))]
    pub async fn set_manual_amount(&self, id: Uuid, input: &str) -> Result<PeriodView, ServiceError> {
        let override_amount = parse_manual_amount(input)?;
        let period = self.find_period(id).await?;

        let mut active: PeriodActiveModel = period.into();
        active.manual_amount = Set(override_amount);
        let updated = active.update(self.db.as_ref()).await?;

        match override_amount {
            Some(amount) => info!(start = %updated.start_date, %amount, "Manual amount set"),
            None => info!(start = %updated.start_date, "Manual amount cleared"),
        }
        self.refreshed_view(updated).await
    }

    async fn refreshed_view(&self, period: PeriodModel) -> Result<PeriodView, ServiceError> {
        let records = sales::load_tracked_sales(&self.db, &self.config.tracked_title).await?;
        Ok(self.view_of(period, &records))
    }
}
