//! The checkout coordinator.

use common::{CustomerId, VendorId};
use domain::{
    Cart, NewOrder, OrderLedger, VendorGroup,
    storage::{CatalogStore, OrderStore},
};

use crate::error::CheckoutError;
use crate::notify::{Notification, NotificationSink, Recipient, Severity};
use crate::outcome::{CheckoutOutcome, FailedGroup, PlacedOrder};

/// A checkout submission: a cart plus the customer's delivery details and
/// an idempotency key chosen by the client for this attempt.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub cart: Cart,
    pub shipping_address: String,
    pub payment_method: String,
    /// Client-chosen key identifying this checkout. Retries of the same
    /// checkout must reuse the same key.
    pub checkout_key: String,
}

/// Places one order per vendor for a cart.
///
/// Groups are processed sequentially in first-seen vendor order. The
/// per-group key `{checkout_key}:{vendor_id}` makes retries resume: a
/// group whose order already exists is reused, not duplicated.
pub struct CheckoutCoordinator<S, C, N> {
    ledger: OrderLedger<S, C>,
    catalog: C,
    notifier: N,
}

impl<S, C, N> CheckoutCoordinator<S, C, N>
where
    S: OrderStore,
    C: CatalogStore + Clone,
    N: NotificationSink,
{
    /// Creates a coordinator over the given stores and notification sink.
    pub fn new(store: S, catalog: C, notifier: N) -> Self {
        Self {
            ledger: OrderLedger::new(store, catalog.clone()),
            catalog,
            notifier,
        }
    }

    /// Runs a checkout: validates the whole cart up front, then places one
    /// order per vendor group, stopping at the first failure.
    ///
    /// Validation failures reject the checkout before anything is written.
    /// A placement failure does not: the outcome reports the orders that
    /// were placed, the group that failed, and the groups never attempted.
    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn run(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, CheckoutError> {
        self.validate_cart(&request.cart).await?;

        let groups = request.cart.partition_by_vendor();
        let mut placed = Vec::with_capacity(groups.len());
        let mut failed = None;
        let mut skipped = Vec::new();

        let mut remaining = groups.into_iter();
        while let Some(group) = remaining.next() {
            match self.place_group(&request, &group).await {
                Ok(order) => placed.push(order),
                Err(err) => {
                    tracing::warn!(
                        vendor_id = %group.vendor_id,
                        error = %err,
                        "vendor group failed, stopping checkout"
                    );
                    failed = Some(FailedGroup {
                        vendor_id: group.vendor_id,
                        vendor_name: group.vendor_name,
                        error: err,
                    });
                    skipped = remaining.map(|g| g.vendor_id).collect();
                    break;
                }
            }
        }

        let outcome = CheckoutOutcome {
            placed,
            failed,
            skipped,
        };

        if outcome.is_complete() {
            metrics::counter!("checkouts_completed_total").increment(1);
            self.notify(Notification {
                recipient: Recipient::Customer(request.customer_id),
                severity: Severity::Success,
                title: "Order placed".to_string(),
                message: format!(
                    "Your order was split into {} vendor order(s)",
                    outcome.placed.len()
                ),
            })
            .await;
        } else {
            metrics::counter!("checkouts_partial_total").increment(1);
        }

        Ok(outcome)
    }

    /// Checks every cart line before anything is written: known product,
    /// positive quantity, enough stock.
    async fn validate_cart(&self, cart: &Cart) -> Result<(), CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        for line in &cart.lines {
            if line.quantity == 0 {
                return Err(CheckoutError::ZeroQuantity {
                    product_id: line.product_id,
                });
            }
            let product = self
                .catalog
                .get_product(line.product_id)
                .await?
                .ok_or(CheckoutError::UnknownProduct {
                    product_id: line.product_id,
                })?;
            if line.quantity > product.stock {
                return Err(CheckoutError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: product.stock,
                });
            }
        }
        Ok(())
    }

    /// Places (or finds already placed) the order for one vendor group.
    /// Returns the error as a string because it is reported in the
    /// outcome, not propagated.
    async fn place_group(
        &self,
        request: &CheckoutRequest,
        group: &VendorGroup,
    ) -> Result<PlacedOrder, String> {
        let key = format!("{}:{}", request.checkout_key, group.vendor_id);

        if let Some(existing) = self
            .ledger
            .find_by_checkout_key(&key)
            .await
            .map_err(|e| e.to_string())?
        {
            tracing::info!(
                order_id = %existing.id,
                vendor_id = %group.vendor_id,
                "reusing order from earlier attempt"
            );
            return Ok(PlacedOrder {
                vendor_id: group.vendor_id,
                vendor_name: group.vendor_name.clone(),
                order_id: existing.id,
                total: existing.total,
                reused: true,
            });
        }

        let draft = NewOrder {
            customer_id: request.customer_id,
            customer_name: request.customer_name.clone(),
            vendor_id: group.vendor_id,
            vendor_name: group.vendor_name.clone(),
            products: group.line_items(),
            total: group.total(),
            shipping_address: request.shipping_address.clone(),
            payment_method: request.payment_method.clone(),
            checkout_key: Some(key),
        };

        let order = self.ledger.create(draft).await.map_err(|e| e.to_string())?;

        self.notify(Notification {
            recipient: Recipient::Vendor(group.vendor_id),
            severity: Severity::Info,
            title: "New order received".to_string(),
            message: format!("{} placed an order for {}", request.customer_name, order.total),
        })
        .await;

        Ok(PlacedOrder {
            vendor_id: group.vendor_id,
            vendor_name: group.vendor_name.clone(),
            order_id: order.id,
            total: order.total,
            reused: false,
        })
    }

    /// Best-effort delivery; a failed notification never fails checkout.
    async fn notify(&self, notification: Notification) {
        if let Err(err) = self.notifier.deliver(notification).await {
            tracing::warn!(error = %err, "notification delivery failed");
        }
    }

    /// Returns the ids of the vendors a retry with the same key would
    /// still need to place orders for.
    pub async fn unplaced_vendors(
        &self,
        checkout_key: &str,
        cart: &Cart,
    ) -> Result<Vec<VendorId>, CheckoutError> {
        let mut pending = Vec::new();
        for group in cart.partition_by_vendor() {
            let key = format!("{}:{}", checkout_key, group.vendor_id);
            if self.ledger.find_by_checkout_key(&key).await?.is_none() {
                pending.push(group.vendor_id);
            }
        }
        Ok(pending)
    }
}
