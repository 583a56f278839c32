//! Checkout endpoint.

use std::sync::Arc;

use ::checkout::{CheckoutOutcome, CheckoutRequest, FailedGroup, PlacedOrder};
use axum::extract::State;
use axum::http::StatusCode;
use common::{CustomerId, Money, OrderId, ProductId, VendorId};
use domain::{Cart, CartLine};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::Json;

use super::{AppState, Backend};

// -- Request types --

#[derive(Deserialize)]
pub struct CheckoutBody {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub items: Vec<CartItemRequest>,
    pub shipping_address: String,
    pub payment_method: String,
    /// Client-chosen idempotency key; retries must reuse it.
    pub checkout_key: String,
}

#[derive(Deserialize)]
pub struct CartItemRequest {
    pub product_id: ProductId,
    pub product_name: String,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    /// Unit price in decimal dollars.
    pub price: f64,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub complete: bool,
    pub placed: Vec<PlacedOrderResponse>,
    pub failed: Option<FailedGroupResponse>,
    pub skipped: Vec<VendorId>,
}

#[derive(Serialize)]
pub struct PlacedOrderResponse {
    pub order_id: OrderId,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub total: f64,
    pub reused: bool,
}

#[derive(Serialize)]
pub struct FailedGroupResponse {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub error: String,
}

impl From<PlacedOrder> for PlacedOrderResponse {
    fn from(p: PlacedOrder) -> Self {
        Self {
            order_id: p.order_id,
            vendor_id: p.vendor_id,
            vendor_name: p.vendor_name,
            total: p.total.as_f64(),
            reused: p.reused,
        }
    }
}

impl From<FailedGroup> for FailedGroupResponse {
    fn from(f: FailedGroup) -> Self {
        Self {
            vendor_id: f.vendor_id,
            vendor_name: f.vendor_name,
            error: f.error,
        }
    }
}

impl From<CheckoutOutcome> for CheckoutResponse {
    fn from(outcome: CheckoutOutcome) -> Self {
        Self {
            complete: outcome.is_complete(),
            placed: outcome.placed.into_iter().map(Into::into).collect(),
            failed: outcome.failed.map(Into::into),
            skipped: outcome.skipped,
        }
    }
}

// -- Handlers --

/// POST /checkout — split the cart into one order per vendor and place
/// them. Returns 201 when every group produced an order, 207 when a
/// group failed and the outcome reports partial results.
#[tracing::instrument(skip(state, body), fields(customer_id = %body.customer_id))]
pub async fn run<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Json(body): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let cart = Cart::new(
        body.items
            .into_iter()
            .map(|item| CartLine {
                product_id: item.product_id,
                product_name: item.product_name,
                vendor_id: item.vendor_id,
                vendor_name: item.vendor_name,
                unit_price: Money::from_dollars_f64(item.price),
                quantity: item.quantity,
            })
            .collect(),
    );

    let outcome = state
        .checkout
        .run(CheckoutRequest {
            customer_id: body.customer_id,
            customer_name: body.customer_name,
            cart,
            shipping_address: body.shipping_address,
            payment_method: body.payment_method,
            checkout_key: body.checkout_key,
        })
        .await?;

    let status = if outcome.is_complete() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(outcome.into())))
}
