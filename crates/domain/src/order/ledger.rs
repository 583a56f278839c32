//! Order ledger service: durable storage and status governance.

use chrono::Utc;
use common::{CustomerId, OrderId, VendorId};

use crate::storage::{CatalogStore, OrderStore, StorageError};

use super::{NewOrder, Order, OrderError, OrderStatus};

/// Owns order creation and the status state machine.
///
/// All order mutation goes through this service; stores are only reached
/// through the [`OrderStore`] trait so backends stay swappable.
pub struct OrderLedger<S, C> {
    store: S,
    catalog: C,
}

impl<S, C> OrderLedger<S, C>
where
    S: OrderStore,
    C: CatalogStore,
{
    /// Creates a ledger over the given stores.
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Validates and persists a draft order with status `pending`.
    ///
    /// Beyond the draft's self-contained checks, every line item's product
    /// must exist in the catalog and belong to the order's vendor — an
    /// order is single-vendor by construction.
    #[tracing::instrument(skip(self, draft), fields(vendor_id = %draft.vendor_id))]
    pub async fn create(&self, draft: NewOrder) -> Result<Order, OrderError> {
        draft.validate()?;

        for line in &draft.products {
            let product = self
                .catalog
                .get_product(line.product_id)
                .await?
                .ok_or(OrderError::UnknownProduct {
                    product_id: line.product_id,
                })?;
            if product.vendor_id != draft.vendor_id {
                return Err(OrderError::VendorMismatch {
                    product_id: line.product_id,
                    expected: draft.vendor_id,
                    actual: product.vendor_id,
                });
            }
        }

        let order = Order::from_draft(draft, Utc::now())?;
        self.store.insert_order(order.clone()).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total, "order created");

        Ok(order)
    }

    /// Applies a status transition, enforcing the state machine.
    ///
    /// The store write is a compare-and-set against the status read here;
    /// a concurrent transition surfaces as [`StorageError::Conflict`] and
    /// leaves the order unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;

        if !order.status.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        let updated_at = Utc::now();
        self.store
            .update_status(id, order.status, new_status, updated_at)
            .await?;

        metrics::counter!("order_status_transitions_total").increment(1);
        tracing::info!(order_id = %id, from = %order.status, to = %new_status, "order status updated");

        Ok(Order {
            status: new_status,
            updated_at,
            ..order
        })
    }

    /// Loads an order by id.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, StorageError> {
        self.store.get_order(id).await
    }

    /// Returns all orders, newest first.
    pub async fn list_all(&self) -> Result<Vec<Order>, StorageError> {
        self.store.list_orders().await
    }

    /// Returns a customer's orders, newest first.
    pub async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, StorageError> {
        self.store.list_by_customer(customer_id).await
    }

    /// Returns a vendor's orders, newest first.
    pub async fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, StorageError> {
        self.store.list_by_vendor(vendor_id).await
    }

    /// Looks up an order by its checkout idempotency key.
    pub async fn find_by_checkout_key(&self, key: &str) -> Result<Option<Order>, StorageError> {
        self.store.find_by_checkout_key(key).await
    }
}
