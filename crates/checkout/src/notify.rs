//! Checkout notifications.
//!
//! Delivery is best effort: a failed notification is logged and never
//! fails the checkout that produced it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{CustomerId, Role, VendorId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Notification severity, mirrored in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum Recipient {
    Customer(CustomerId),
    Vendor(VendorId),
}

impl Recipient {
    /// Returns the role the recipient is addressed as.
    pub fn role(&self) -> Role {
        match self {
            Recipient::Customer(_) => Role::Customer,
            Recipient::Vendor(_) => Role::Vendor,
        }
    }
}

/// A user-facing notification emitted by checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

/// Failed notification delivery.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Delivery channel for checkout notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Sink that records notifications in memory, for tests and development.
///
/// Clones share the same underlying list.
#[derive(Clone, Default)]
pub struct InMemoryNotificationSink {
    sent: Arc<tokio::sync::Mutex<Vec<Notification>>>,
    fail_deliveries: Arc<AtomicBool>,
}

impl InMemoryNotificationSink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent deliveries fail.
    pub fn set_fail_deliveries(&self, fail: bool) {
        self.fail_deliveries.store(fail, Ordering::SeqCst);
    }

    /// Returns a snapshot of everything delivered so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn deliver(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.fail_deliveries.load(Ordering::SeqCst) {
            return Err(NotifyError("injected delivery failure".to_string()));
        }
        self.sent.lock().await.push(notification);
        Ok(())
    }
}
