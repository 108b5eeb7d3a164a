//! Order placement and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{CustomerId, LineItem, Order, OrderDetails, OrderId, OrderStatus, ProductId};
use serde::{Deserialize, Serialize};
use service::{CreateOrder, RequestedItem};
use store::Store;

use super::{AmountResponse, parse_id};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub created_at: String,
    pub total: AmountResponse,
    pub items: Vec<LineItemResponse>,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub id: String,
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub quantity: u32,
    pub unit_price: AmountResponse,
    pub subtotal: AmountResponse,
}

impl LineItemResponse {
    fn new(item: &LineItem, product_name: Option<&str>) -> Self {
        Self {
            id: item.id().to_string(),
            product_id: item.product_id().to_string(),
            product_name: product_name.map(str::to_string),
            quantity: item.quantity(),
            unit_price: item.unit_price().into(),
            subtotal: item.subtotal().into(),
        }
    }
}

impl OrderResponse {
    fn with_items(order: &Order, items: Vec<LineItemResponse>) -> Self {
        Self {
            id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            status: order.status(),
            created_at: order.created_at().to_rfc3339(),
            total: order.total().into(),
            items,
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let items = order
            .items()
            .iter()
            .map(|item| LineItemResponse::new(item, None))
            .collect();
        Self::with_items(order, items)
    }
}

impl From<&OrderDetails> for OrderResponse {
    fn from(details: &OrderDetails) -> Self {
        let items = details
            .order
            .items()
            .iter()
            .map(|item| {
                let name = details.product(item.product_id()).map(|p| p.name());
                LineItemResponse::new(item, name)
            })
            .collect();
        Self::with_items(&details.order, items)
    }
}

// -- Handlers --

/// POST /api/customers/{id}/orders
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let customer_id: CustomerId = parse_id(&id)?;
    let items = req
        .items
        .iter()
        .map(|item| {
            Ok(RequestedItem {
                product_id: parse_id::<ProductId>(&item.product_id)?,
                quantity: item.quantity,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let order = state
        .orders
        .create_order(CreateOrder::new(customer_id, items))
        .await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /api/customers/{id}/orders
#[tracing::instrument(skip(state))]
pub async fn list_for_customer<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let customer_id: CustomerId = parse_id(&id)?;
    let orders = state.orders.list_orders_for_customer(customer_id).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /api/orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let details = state.orders.find_order_with_items(order_id).await?;
    Ok(Json(OrderResponse::from(&details)))
}

/// PUT /api/orders/{id}/status
///
/// The status name is matched case-insensitively; an unknown name is a 400
/// and a forbidden move is a 409.
#[tracing::instrument(skip(state, req))]
pub async fn change_status<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ChangeStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let status: OrderStatus = req.status.parse()?;
    let order = state.orders.change_status(order_id, status).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /api/orders/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let order = state.orders.cancel_order(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}
