//! Client-held shopping cart and vendor partitioning.

use common::{Money, ProductId, VendorId};
use serde::{Deserialize, Serialize};

use crate::order::LineItem;

/// One cart entry: a product snapshot and a quantity.
///
/// Name and price are captured at add-to-cart time so a mid-session price
/// change does not alter an in-flight cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartLine {
    /// Returns price × quantity for this line.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// The subset of a cart belonging to one vendor — the unit of order
/// creation during checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorGroup {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub lines: Vec<CartLine>,
}

impl VendorGroup {
    /// Returns the group's total from its price snapshots.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Converts the group's cart lines into order line items.
    pub fn line_items(&self) -> Vec<LineItem> {
        self.lines
            .iter()
            .map(|l| LineItem::new(l.product_id, l.product_name.clone(), l.unit_price, l.quantity))
            .collect()
    }
}

/// An ephemeral, session-held shopping cart. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a cart from its lines.
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the cart subtotal (excluding shipping).
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Partitions the cart into one group per vendor, preserving the order
    /// in which vendors first appear.
    pub fn partition_by_vendor(&self) -> Vec<VendorGroup> {
        let mut groups: Vec<VendorGroup> = Vec::new();
        for line in &self.lines {
            match groups.iter_mut().find(|g| g.vendor_id == line.vendor_id) {
                Some(group) => group.lines.push(line.clone()),
                None => groups.push(VendorGroup {
                    vendor_id: line.vendor_id,
                    vendor_name: line.vendor_name.clone(),
                    lines: vec![line.clone()],
                }),
            }
        }
        groups
    }
}
