use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    services::orders::{
        OrderListRequest, OrderListResponse, OrderService, OrderSort, OrderView, PackedFilter,
    },
    ApiResponse, AppState,
};

/// Build the orders Router merged under `/api/v1`.
pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/:id/toggle-packed", post(toggle_packed))
}

/// Query parameters for the order list
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OrderListQuery {
    /// Packing state to show (packed | unpacked, default unpacked)
    pub status: Option<PackedFilter>,
    /// Free-text search over order number, customer, and address
    pub q: Option<String>,
    /// Sort key (oldest | newest | value_high | value_low)
    pub sort: Option<OrderSort>,
    /// Show every matching order instead of the short packing view
    #[serde(default)]
    pub view_all: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders matching the filter", body = ApiResponse<OrderListResponse>)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<OrderListResponse>>, ServiceError> {
    let service = OrderService::new(state.db.clone());

    let request = OrderListRequest {
        status: params.status.unwrap_or_default(),
        search: params.q,
        sort: params.sort.unwrap_or_default(),
        view_all: params.view_all,
    };

    let list = service.list_orders(request).await?;
    Ok(Json(ApiResponse::success(list)))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/toggle-packed",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with its packing flag flipped", body = ApiResponse<OrderView>),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn toggle_packed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderView>>, ServiceError> {
    let service = OrderService::new(state.db.clone());
    let order = service.toggle_packed(id).await?;
    Ok(Json(ApiResponse::success(order)))
}
