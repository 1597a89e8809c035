use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
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
    db::DbPool,
    entities::{
        line_item::{self, Entity as LineItemEntity},
        order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel},
    },
    errors::ServiceError,
};

/// The default dashboard view stays short so the next orders to pack are
/// obvious; searching or asking for everything lifts the cap.
const DEFAULT_UNPACKED_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PackedFilter {
    Packed,
    #[default]
    Unpacked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderSort {
    #[default]
    Oldest,
    Newest,
    ValueHigh,
    ValueLow,
}

#[derive(Debug, Clone, Default)]
pub struct OrderListRequest {
    pub status: PackedFilter,
    pub search: Option<String>,
    pub sort: OrderSort,
    pub view_all: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LineItemView {
    pub product_name: String,
    pub quantity: i32,
    pub sku: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub shipping_address: String,
    pub subtotal: Decimal,
    pub currency: String,
    pub is_fulfilled: bool,
    pub is_packed: bool,
    pub order_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<LineItemView>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderView>,
    /// Orders matching the filter and search, before the short-view cap
    pub total_matching: u64,
    /// How many matching orders the short view is hiding
    pub hidden: u64,
}

/// Packing-floor order queries and the packed toggle.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        request: OrderListRequest,
    ) -> Result<OrderListResponse, ServiceError> {
        let packed = request.status == PackedFilter::Packed;

        let mut orders = OrderEntity::find()
            .filter(order::Column::IsPacked.eq(packed))
            .order_by_asc(order::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        let search = request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        if let Some(q) = &search {
            orders.retain(|o| {
                o.order_number.to_lowercase().contains(q)
                    || o.customer_name.to_lowercase().contains(q)
                    || o.shipping_address.to_lowercase().contains(q)
            });
        }

        match request.sort {
            OrderSort::Oldest => {}
            OrderSort::Newest => orders.reverse(),
            OrderSort::ValueHigh => orders.sort_by(|a, b| b.subtotal.cmp(&a.subtotal)),
            OrderSort::ValueLow => orders.sort_by(|a, b| a.subtotal.cmp(&b.subtotal)),
        }

        let total_matching = orders.len() as u64;

        let capped = request.status == PackedFilter::Unpacked
            && search.is_none()
            && !request.view_all;
        if capped {
            orders.truncate(DEFAULT_UNPACKED_LIMIT);
        }

        let hidden = total_matching - orders.len() as u64;
        let views = self.with_items(orders).await?;

        Ok(OrderListResponse {
            orders: views,
            total_matching,
            hidden,
        })
    }

    /// Flip the staff packing flag.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn toggle_packed(&self, id: Uuid) -> Result<OrderView, ServiceError> {
        let order = OrderEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {id} not found")))?;

        let now_packed = !order.is_packed;
        let mut active: OrderActiveModel = order.into();
        active.is_packed = Set(now_packed);
        let updated = active.update(self.db.as_ref()).await?;

        info!(order_number = %updated.order_number, is_packed = now_packed, "Order packing toggled");

        let mut views = self.with_items(vec![updated]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::InternalError("order view vanished".to_string()))
    }

    async fn with_items(&self, orders: Vec<OrderModel>) -> Result<Vec<OrderView>, ServiceError> {
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

        let mut items_by_order: HashMap<Uuid, Vec<LineItemView>> = HashMap::new();
        if !ids.is_empty() {
            let items = LineItemEntity::find()
                .filter(line_item::Column::OrderId.is_in(ids))
                .all(self.db.as_ref())
                .await?;
            for item in items {
                items_by_order
                    .entry(item.order_id)
                    .or_default()
                    .push(LineItemView {
                        product_name: item.product_name,
                        quantity: item.quantity,
                        sku: item.sku,
                    });
            }
        }

        Ok(orders
            .into_iter()
            .map(|o| {
                let items = items_by_order.remove(&o.id).unwrap_or_default();
                OrderView {
                    id: o.id,
                    order_number: o.order_number,
                    customer_name: o.customer_name,
                    shipping_address: o.shipping_address,
                    subtotal: o.subtotal,
                    currency: o.currency,
                    is_fulfilled: o.is_fulfilled,
                    is_packed: o.is_packed,
                    order_date: o.order_date,
                    created_at: o.created_at,
                    items,
                }
            })
            .collect())
    }
}
