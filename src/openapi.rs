use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pressroom API",
        description = r#"
Back-office API for a small press.

- **Orders**: storefront orders with their line items and the packing workflow
- **Payments**: royalty payment periods derived from tracked-title sales
- **Analytics**: sales reporting for the tracked title
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Order list and packing endpoints"),
        (name = "Payments", description = "Royalty payment period endpoints"),
        (name = "Analytics", description = "Tracked-title sales reporting"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::orders::list_orders,
        crate::handlers::orders::toggle_packed,
        crate::handlers::payments::payments_dashboard,
        crate::handlers::payments::mark_paid,
        crate::handlers::payments::mark_unpaid,
        crate::handlers::payments::set_amount,
        crate::handlers::analytics::sales_report,
        crate::handlers::health::health,
    ),
    components(
        schemas(
            crate::ApiResponse<crate::services::orders::OrderListResponse>,
            crate::ApiResponse<crate::services::orders::OrderView>,
            crate::ApiResponse<crate::services::royalties::PaymentsDashboard>,
            crate::ApiResponse<crate::services::royalties::PeriodView>,
            crate::ApiResponse<crate::services::analytics::SalesReport>,
            crate::services::orders::OrderListResponse,
            crate::services::orders::OrderView,
            crate::services::orders::LineItemView,
            crate::services::orders::PackedFilter,
            crate::services::orders::OrderSort,
            crate::services::royalties::PaymentsDashboard,
            crate::services::royalties::PeriodView,
            crate::services::royalties::PeriodStatus,
            crate::handlers::payments::SetAmountRequest,
            crate::services::analytics::SalesReport,
            crate::services::analytics::ReportWindow,
            crate::services::analytics::SaleKind,
            crate::handlers::health::HealthResponse,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_includes_the_core_surfaces() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Pressroom API"));
        assert!(json.contains("/api/v1/orders"));
        assert!(json.contains("/api/v1/payments"));
        assert!(json.contains("/api/v1/analytics/sales"));
    }
}
