//! In-memory backend for tests and development.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId, ReviewId, VendorId};
use domain::{
    Category, Order, OrderStatus, Product, Review,
    storage::{CatalogStore, OrderStore, ReviewStore, StorageError},
};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    products: Vec<Product>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
}

/// In-memory backend holding all tables behind one lock.
///
/// Clones share the same underlying tables, mirroring how the PostgreSQL
/// backend shares a pool. Provides fault-injection toggles for exercising
/// partial-failure paths in tests.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    tables: Arc<RwLock<Tables>>,
    fail_order_inserts: Arc<AtomicBool>,
    fail_aggregate_writes: Arc<AtomicBool>,
}

impl MemoryBackend {
    /// Creates a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent order inserts fail with a backend error.
    pub fn set_fail_order_inserts(&self, fail: bool) {
        self.fail_order_inserts.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent rating aggregate writes fail with a backend error.
    pub fn set_fail_aggregate_writes(&self, fail: bool) {
        self.fail_aggregate_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of stored reviews.
    pub async fn review_count(&self) -> usize {
        self.tables.read().await.reviews.len()
    }
}

fn newest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    items
}

#[async_trait]
impl CatalogStore for MemoryBackend {
    async fn insert_product(&self, product: Product) -> Result<(), StorageError> {
        self.tables.write().await.products.push(product);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Product>, StorageError> {
        let tables = self.tables.read().await;
        let products: Vec<_> = tables
            .products
            .iter()
            .filter(|p| p.vendor_id == vendor_id)
            .cloned()
            .collect();
        Ok(newest_first(products, |p| p.created_at))
    }

    async fn list_approved(
        &self,
        category: Option<Category>,
    ) -> Result<Vec<Product>, StorageError> {
        let tables = self.tables.read().await;
        let products: Vec<_> = tables
            .products
            .iter()
            .filter(|p| p.approved && category.is_none_or(|c| p.category == c))
            .cloned()
            .collect();
        Ok(newest_first(products, |p| p.created_at))
    }

    async fn set_approval(&self, id: ProductId, approved: bool) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StorageError::not_found("product", id))?;
        product.approved = approved;
        Ok(())
    }

    async fn set_featured(&self, id: ProductId, featured: bool) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StorageError::not_found("product", id))?;
        product.featured = featured;
        Ok(())
    }

    async fn update_aggregate(
        &self,
        id: ProductId,
        rating: f64,
        review_count: u64,
    ) -> Result<(), StorageError> {
        if self.fail_aggregate_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(
                "injected aggregate write failure".to_string(),
            ));
        }
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StorageError::not_found("product", id))?;
        product.rating = rating;
        product.review_count = review_count;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryBackend {
    async fn insert_order(&self, order: Order) -> Result<(), StorageError> {
        if self.fail_order_inserts.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(
                "injected order insert failure".to_string(),
            ));
        }
        self.tables.write().await.orders.push(order);
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StorageError> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.orders.clone(), |o| o.created_at))
    }

    async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, StorageError> {
        let tables = self.tables.read().await;
        let orders: Vec<_> = tables
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        Ok(newest_first(orders, |o| o.created_at))
    }

    async fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, StorageError> {
        let tables = self.tables.read().await;
        let orders: Vec<_> = tables
            .orders
            .iter()
            .filter(|o| o.vendor_id == vendor_id)
            .cloned()
            .collect();
        Ok(newest_first(orders, |o| o.created_at))
    }

    async fn find_by_checkout_key(&self, key: &str) -> Result<Option<Order>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .find(|o| o.checkout_key.as_deref() == Some(key))
            .cloned())
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StorageError::not_found("order", id))?;
        // Compare-and-set under the table lock.
        if order.status != expected {
            return Err(StorageError::conflict("order", id));
        }
        order.status = new_status;
        order.updated_at = updated_at;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MemoryBackend {
    async fn insert_review(&self, review: Review) -> Result<(), StorageError> {
        self.tables.write().await.reviews.push(review);
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        tables.reviews.retain(|r| r.id != id);
        Ok(())
    }

    async fn list_by_product(&self, product_id: ProductId) -> Result<Vec<Review>, StorageError> {
        let tables = self.tables.read().await;
        let reviews: Vec<_> = tables
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        Ok(newest_first(reviews, |r| r.created_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::Money;
    use domain::{LineItem, NewOrder};

    fn product(vendor_id: VendorId) -> Product {
        Product::new(
            "Vase",
            "Hand-thrown stoneware vase",
            Money::from_cents(2999),
            vendor_id,
            "Clay & Co",
            Category::Pottery,
            vec!["https://img.example/vase.jpg".to_string()],
            10,
        )
    }

    fn order(customer_id: CustomerId, vendor_id: VendorId, product_id: ProductId) -> Order {
        let draft = NewOrder {
            customer_id,
            customer_name: "Ada".to_string(),
            vendor_id,
            vendor_name: "Clay & Co".to_string(),
            products: vec![LineItem::new(product_id, "Vase", Money::from_cents(2999), 1)],
            total: Money::from_cents(2999),
            shipping_address: "1 Main St".to_string(),
            payment_method: "Credit Card".to_string(),
            checkout_key: None,
        };
        Order::from_draft(draft, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn product_insert_and_get() {
        let backend = MemoryBackend::new();
        let p = product(VendorId::new());
        backend.insert_product(p.clone()).await.unwrap();

        let fetched = backend.get_product(p.id).await.unwrap();
        assert_eq!(fetched, Some(p));

        let missing = backend.get_product(ProductId::new()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn list_approved_filters_by_category() {
        let backend = MemoryBackend::new();
        let mut approved = product(VendorId::new());
        approved.approved = true;
        let unapproved = product(VendorId::new());
        backend.insert_product(approved.clone()).await.unwrap();
        backend.insert_product(unapproved).await.unwrap();

        let listed = backend.list_approved(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, approved.id);

        let jewelry = backend
            .list_approved(Some(Category::Jewelry))
            .await
            .unwrap();
        assert!(jewelry.is_empty());
    }

    #[tokio::test]
    async fn set_approval_unknown_product_is_not_found() {
        let backend = MemoryBackend::new();
        let result = backend.set_approval(ProductId::new(), true).await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn orders_listed_newest_first() {
        let backend = MemoryBackend::new();
        let customer = CustomerId::new();
        let vendor = VendorId::new();

        let mut older = order(customer, vendor, ProductId::new());
        older.created_at = Utc::now() - Duration::minutes(5);
        let newer = order(customer, vendor, ProductId::new());

        backend.insert_order(older.clone()).await.unwrap();
        backend.insert_order(newer.clone()).await.unwrap();

        let listed = backend.list_by_customer(customer).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }

    #[tokio::test]
    async fn update_status_is_compare_and_set() {
        let backend = MemoryBackend::new();
        let o = order(CustomerId::new(), VendorId::new(), ProductId::new());
        backend.insert_order(o.clone()).await.unwrap();

        backend
            .update_status(o.id, OrderStatus::Pending, OrderStatus::Processing, Utc::now())
            .await
            .unwrap();

        // Stale expectation loses the race.
        let result = backend
            .update_status(o.id, OrderStatus::Pending, OrderStatus::Cancelled, Utc::now())
            .await;
        assert!(matches!(result, Err(StorageError::Conflict { .. })));

        let stored = backend.get_order(o.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn update_status_unknown_order_is_not_found() {
        let backend = MemoryBackend::new();
        let result = backend
            .update_status(
                OrderId::new(),
                OrderStatus::Pending,
                OrderStatus::Processing,
                Utc::now(),
            )
            .await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn find_by_checkout_key() {
        let backend = MemoryBackend::new();
        let mut o = order(CustomerId::new(), VendorId::new(), ProductId::new());
        o.checkout_key = Some("session-1:vendor-a".to_string());
        backend.insert_order(o.clone()).await.unwrap();

        let found = backend
            .find_by_checkout_key("session-1:vendor-a")
            .await
            .unwrap();
        assert_eq!(found.map(|o| o.id), Some(o.id));

        let missing = backend.find_by_checkout_key("session-2:vendor-a").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn injected_order_insert_failure() {
        let backend = MemoryBackend::new();
        backend.set_fail_order_inserts(true);

        let o = order(CustomerId::new(), VendorId::new(), ProductId::new());
        let result = backend.insert_order(o).await;
        assert!(matches!(result, Err(StorageError::Backend(_))));
        assert_eq!(backend.order_count().await, 0);
    }
}
