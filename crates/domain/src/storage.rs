//! Storage traits the ledger services are written against.
//!
//! Backends live in the `store` crate (in-memory and PostgreSQL); the core
//! never depends on a process-local singleton surviving restarts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId, ReviewId, VendorId};
use thiserror::Error;

use crate::order::{Order, OrderStatus};
use crate::product::{Category, Product};
use crate::review::Review;

/// Errors surfaced by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A conditional write lost a race against a concurrent mutation.
    /// Safe to retry once with a fresh read.
    #[error("conflict updating {entity} {id}: state changed concurrently")]
    Conflict { entity: &'static str, id: String },

    /// The underlying store failed or is unavailable.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Shorthand for a [`StorageError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`StorageError::Conflict`].
    pub fn conflict(entity: &'static str, id: impl ToString) -> Self {
        Self::Conflict {
            entity,
            id: id.to_string(),
        }
    }
}

/// Product catalog storage, the interface the core consumes from the
/// catalog collaborator.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Stores a newly uploaded product.
    async fn insert_product(&self, product: Product) -> Result<(), StorageError>;

    /// Fetches a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StorageError>;

    /// Returns all products owned by a vendor, newest first.
    async fn get_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Product>, StorageError>;

    /// Returns approved products, optionally filtered by category, newest
    /// first.
    async fn list_approved(&self, category: Option<Category>) -> Result<Vec<Product>, StorageError>;

    /// Sets the admin approval flag. Fails with `NotFound` for unknown ids.
    async fn set_approval(&self, id: ProductId, approved: bool) -> Result<(), StorageError>;

    /// Sets the featured flag. Fails with `NotFound` for unknown ids.
    async fn set_featured(&self, id: ProductId, featured: bool) -> Result<(), StorageError>;

    /// Writes the derived rating aggregate onto the product row.
    /// Fails with `NotFound` for unknown ids.
    async fn update_aggregate(
        &self,
        id: ProductId,
        rating: f64,
        review_count: u64,
    ) -> Result<(), StorageError>;
}

/// Order ledger storage.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores a new order.
    async fn insert_order(&self, order: Order) -> Result<(), StorageError>;

    /// Fetches an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StorageError>;

    /// Returns all orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, StorageError>;

    /// Returns a customer's orders, newest first.
    async fn list_by_customer(&self, customer_id: CustomerId)
    -> Result<Vec<Order>, StorageError>;

    /// Returns a vendor's orders, newest first.
    async fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, StorageError>;

    /// Looks up an order by its checkout idempotency key.
    async fn find_by_checkout_key(&self, key: &str) -> Result<Option<Order>, StorageError>;

    /// Conditionally moves an order from `expected` to `new_status`.
    ///
    /// The write must be a single atomic compare-and-set (`WHERE status =
    /// expected` or equivalent): `NotFound` for unknown ids, `Conflict`
    /// when the stored status no longer matches `expected`.
    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// Review ledger storage.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Stores a new review.
    async fn insert_review(&self, review: Review) -> Result<(), StorageError>;

    /// Removes a review. Used only to compensate a failed aggregate write.
    async fn delete_review(&self, id: ReviewId) -> Result<(), StorageError>;

    /// Returns a product's reviews, newest first.
    async fn list_by_product(&self, product_id: ProductId) -> Result<Vec<Review>, StorageError>;
}
