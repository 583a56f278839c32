//! Order entities and validation.

mod ledger;
mod status;

pub use ledger::OrderLedger;
pub use status::OrderStatus;

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId, VendorId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

/// Errors from order validation and ledger operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order has no line items.
    #[error("order has no line items")]
    Empty,

    /// A line item has quantity zero.
    #[error("line item for product {product_id} has quantity 0")]
    ZeroQuantity { product_id: ProductId },

    /// The declared total does not match the sum of line items.
    #[error("declared total {declared} does not match line item sum {computed}")]
    TotalMismatch { declared: Money, computed: Money },

    /// A line item references a product that does not exist in the catalog.
    #[error("line item references unknown product {product_id}")]
    UnknownProduct { product_id: ProductId },

    /// A line item's product belongs to a different vendor than the order.
    #[error("product {product_id} belongs to vendor {actual}, order is for vendor {expected}")]
    VendorMismatch {
        product_id: ProductId,
        expected: VendorId,
        actual: VendorId,
    },

    /// The requested status transition violates the state machine.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order does not exist.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// The underlying store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One (product, price snapshot, quantity) entry inside an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    /// Product name captured at add-to-cart time.
    pub name: String,
    /// Unit price captured at add-to-cart time, not a live re-fetch.
    pub price: Money,
    pub quantity: u32,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Returns price × quantity for this line.
    pub fn line_total(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// A draft order submitted for creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub products: Vec<LineItem>,
    /// Declared total; must equal the sum of line totals.
    pub total: Money,
    pub shipping_address: String,
    pub payment_method: String,
    /// Idempotency key supplied by checkout, `None` for direct creation.
    pub checkout_key: Option<String>,
}

impl NewOrder {
    /// Validates the draft's self-contained invariants: at least one line,
    /// no zero quantities, declared total equal to the line item sum.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.products.is_empty() {
            return Err(OrderError::Empty);
        }
        for line in &self.products {
            if line.quantity == 0 {
                return Err(OrderError::ZeroQuantity {
                    product_id: line.product_id,
                });
            }
        }
        let computed: Money = self.products.iter().map(LineItem::line_total).sum();
        if computed != self.total {
            return Err(OrderError::TotalMismatch {
                declared: self.total,
                computed,
            });
        }
        Ok(())
    }
}

/// A persisted order.
///
/// Single-vendor by construction: every line item's product belongs to
/// `vendor_id`. Mutated only through the status-transition operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub products: Vec<LineItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub payment_method: String,
    pub checkout_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Materializes a validated draft into a pending order.
    pub fn from_draft(draft: NewOrder, now: DateTime<Utc>) -> Result<Self, OrderError> {
        draft.validate()?;
        Ok(Self {
            id: OrderId::new(),
            customer_id: draft.customer_id,
            customer_name: draft.customer_name,
            vendor_id: draft.vendor_id,
            vendor_name: draft.vendor_name,
            products: draft.products,
            total: draft.total,
            status: OrderStatus::Pending,
            shipping_address: draft.shipping_address,
            payment_method: draft.payment_method,
            checkout_key: draft.checkout_key,
            created_at: now,
            updated_at: now,
        })
    }
}
