//! Order endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId, VendorId};
use domain::{LineItem, NewOrder, Order, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::Json;

use super::{AppState, Backend};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub products: Vec<LineItemRequest>,
    /// Declared total in decimal dollars; must match the line item sum.
    pub total: f64,
    pub shipping_address: String,
    pub payment_method: String,
}

#[derive(Deserialize)]
pub struct LineItemRequest {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price in decimal dollars.
    pub price: f64,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub products: Vec<LineItemResponse>,
    pub total: f64,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub product_id: ProductId,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            customer_name: order.customer_name,
            vendor_id: order.vendor_id,
            vendor_name: order.vendor_name,
            products: order
                .products
                .into_iter()
                .map(|item| LineItemResponse {
                    product_id: item.product_id,
                    name: item.name,
                    price: item.price.as_f64(),
                    quantity: item.quantity,
                })
                .collect(),
            total: order.total.as_f64(),
            status: order.status,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// -- Handlers --

/// POST /orders — create a new order directly (single vendor).
#[tracing::instrument(skip(state, req))]
pub async fn create<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let draft = NewOrder {
        customer_id: req.customer_id,
        customer_name: req.customer_name,
        vendor_id: req.vendor_id,
        vendor_name: req.vendor_name,
        products: req
            .products
            .into_iter()
            .map(|item| {
                LineItem::new(
                    item.product_id,
                    item.name,
                    Money::from_dollars_f64(item.price),
                    item.quantity,
                )
            })
            .collect(),
        total: Money::from_dollars_f64(req.total),
        shipping_address: req.shipping_address,
        payment_method: req.payment_method,
        checkout_key: None,
    };

    let order = state.orders.create(draft).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order.into()))
}

/// GET /orders — list all orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_all().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/customer/:id — list a customer's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_by_customer<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<CustomerId>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_by_customer(id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/vendor/:id — list a vendor's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_by_vendor<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<VendorId>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_by_vendor(id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// PATCH /orders/:id/status — apply a status transition.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.update_status(id, req.status).await?;
    Ok(Json(order.into()))
}
