use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    errors::ServiceError,
    services::analytics::{AnalyticsService, ReportWindow, SaleKind, SalesReport},
    ApiResponse, AppState,
};

/// Build the analytics Router merged under `/api/v1`.
pub fn analytics_routes() -> Router<AppState> {
    Router::new().route("/analytics/sales", get(sales_report))
}

/// Query parameters for the sales report
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SalesReportQuery {
    /// Reporting window (day | week | month | year, default month)
    pub period: Option<ReportWindow>,
    /// Sale kind filter (all | preorder | regular, default all)
    #[serde(rename = "type")]
    pub order_type: Option<SaleKind>,
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/sales",
    params(SalesReportQuery),
    responses(
        (status = 200, description = "Sales aggregates for the tracked title", body = ApiResponse<SalesReport>)
    ),
    tag = "Analytics"
)]
pub async fn sales_report(
    State(state): State<AppState>,
    Query(params): Query<SalesReportQuery>,
) -> Result<Json<ApiResponse<SalesReport>>, ServiceError> {
    let service = AnalyticsService::new(
        state.db.clone(),
        state.config.royalty.clone(),
        state.clock.clone(),
    );

    let report = service
        .sales_report(
            params.period.unwrap_or_default(),
            params.order_type.unwrap_or_default(),
        )
        .await?;

    Ok(Json(ApiResponse::success(report)))
}
