//! Multi-vendor checkout.
//!
//! Splits a cart into one order per vendor and places them sequentially,
//! reporting exactly which orders were placed when a later one fails.
//! Checkout never pretends to be atomic across vendors: a placed order
//! stays placed, and the outcome tells the caller what remains.

mod coordinator;
mod error;
mod notify;
mod outcome;

pub use coordinator::{CheckoutCoordinator, CheckoutRequest};
pub use error::CheckoutError;
pub use notify::{
    InMemoryNotificationSink, Notification, NotificationSink, NotifyError, Recipient, Severity,
};
pub use outcome::{CheckoutOutcome, FailedGroup, PlacedOrder};
