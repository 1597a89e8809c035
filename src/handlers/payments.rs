use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    services::royalties::{PaymentsDashboard, PeriodView, RoyaltyService},
    ApiResponse, AppState,
};

/// Build the payments Router merged under `/api/v1`.
pub fn payments_routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(payments_dashboard))
        .route("/payments/:id/mark-paid", post(mark_paid))
        .route("/payments/:id/mark-unpaid", post(mark_unpaid))
        .route("/payments/:id/amount", put(set_amount))
}

fn royalty_service(state: &AppState) -> RoyaltyService {
    RoyaltyService::new(
        state.db.clone(),
        state.config.royalty.clone(),
        state.clock.clone(),
    )
}

/// Body for the manual amount override. The raw string is parsed service-side
/// so "£12.50", "12.50", "auto", and "" all behave as staff expect.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAmountRequest {
    pub amount: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/payments",
    responses(
        (status = 200, description = "All payment periods with dashboard totals", body = ApiResponse<PaymentsDashboard>)
    ),
    tag = "Payments"
)]
pub async fn payments_dashboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaymentsDashboard>>, ServiceError> {
    let dashboard = royalty_service(&state).dashboard().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/mark-paid",
    params(("id" = Uuid, Path, description = "Payment period id")),
    responses(
        (status = 200, description = "Period marked paid", body = ApiResponse<PeriodView>),
        (status = 404, description = "Unknown period", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn mark_paid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PeriodView>>, ServiceError> {
    let period = royalty_service(&state).mark_paid(id).await?;
    let message = format!("{} marked as paid (£{})", period.name, period.total_amount);
    Ok(Json(ApiResponse::success_with_message(period, message)))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/mark-unpaid",
    params(("id" = Uuid, Path, description = "Payment period id")),
    responses(
        (status = 200, description = "Period reverted to a date-derived status", body = ApiResponse<PeriodView>),
        (status = 404, description = "Unknown period", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn mark_unpaid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PeriodView>>, ServiceError> {
    let period = royalty_service(&state).mark_unpaid(id).await?;
    let message = format!("{} marked as unpaid", period.name);
    Ok(Json(ApiResponse::success_with_message(period, message)))
}

#[utoipa::path(
    put,
    path = "/api/v1/payments/{id}/amount",
    params(("id" = Uuid, Path, description = "Payment period id")),
    request_body = SetAmountRequest,
    responses(
        (status = 200, description = "Override applied or cleared", body = ApiResponse<PeriodView>),
        (status = 400, description = "Negative or unparseable amount", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown period", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn set_amount(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SetAmountRequest>,
) -> Result<Json<ApiResponse<PeriodView>>, ServiceError> {
    let period = royalty_service(&state)
        .set_manual_amount(id, &body.amount)
        .await?;
    Ok(Json(ApiResponse::success(period)))
}
