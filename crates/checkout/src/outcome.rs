//! Checkout results.

use common::{Money, OrderId, VendorId};
use serde::{Deserialize, Serialize};

/// One order successfully placed (or found already placed) for a vendor
/// group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub order_id: OrderId,
    pub total: Money,
    /// True when an earlier attempt with the same checkout key already
    /// placed this vendor's order and it was reused instead of duplicated.
    pub reused: bool,
}

/// The vendor group whose order placement failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedGroup {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub error: String,
}

/// What a checkout attempt accomplished.
///
/// Placement is sequential, so at most one group fails and the groups
/// after it are skipped untouched. Placed orders stay placed; retrying
/// with the same checkout key resumes where this attempt stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutOutcome {
    pub placed: Vec<PlacedOrder>,
    pub failed: Option<FailedGroup>,
    pub skipped: Vec<VendorId>,
}

impl CheckoutOutcome {
    /// Returns true when every vendor group produced an order.
    pub fn is_complete(&self) -> bool {
        self.failed.is_none() && self.skipped.is_empty()
    }

    /// Returns the ids of all placed orders.
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.placed.iter().map(|p| p.order_id).collect()
    }
}
