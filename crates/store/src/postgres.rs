//! PostgreSQL backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId, ReviewId, VendorId};
use domain::{
    Category, LineItem, Order, OrderStatus, Product, Review,
    storage::{CatalogStore, OrderStore, ReviewStore, StorageError},
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

/// PostgreSQL-backed storage for catalog, orders, and reviews.
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

fn db_err(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

impl PostgresBackend {
    /// Creates a backend over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    fn row_to_product(row: PgRow) -> Result<Product, StorageError> {
        let images: serde_json::Value = row.try_get("images").map_err(db_err)?;
        let category: String = row.try_get("category").map_err(db_err)?;
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_err)?),
            name: row.try_get("name").map_err(db_err)?,
            description: row.try_get("description").map_err(db_err)?,
            price: Money::from_cents(row.try_get::<i64, _>("price_cents").map_err(db_err)?),
            vendor_id: VendorId::from_uuid(row.try_get::<Uuid, _>("vendor_id").map_err(db_err)?),
            vendor_name: row.try_get("vendor_name").map_err(db_err)?,
            category: category
                .parse::<Category>()
                .map_err(StorageError::Backend)?,
            images: serde_json::from_value(images)?,
            rating: row.try_get("rating").map_err(db_err)?,
            review_count: row.try_get::<i64, _>("review_count").map_err(db_err)? as u64,
            approved: row.try_get("approved").map_err(db_err)?,
            featured: row.try_get("featured").map_err(db_err)?,
            stock: row.try_get::<i64, _>("stock").map_err(db_err)? as u32,
            created_at: row.try_get("created_at").map_err(db_err)?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order, StorageError> {
        let products: serde_json::Value = row.try_get("products").map_err(db_err)?;
        let status: String = row.try_get("status").map_err(db_err)?;
        let products: Vec<LineItem> = serde_json::from_value(products)?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_err)?),
            customer_id: CustomerId::from_uuid(
                row.try_get::<Uuid, _>("customer_id").map_err(db_err)?,
            ),
            customer_name: row.try_get("customer_name").map_err(db_err)?,
            vendor_id: VendorId::from_uuid(row.try_get::<Uuid, _>("vendor_id").map_err(db_err)?),
            vendor_name: row.try_get("vendor_name").map_err(db_err)?,
            products,
            total: Money::from_cents(row.try_get::<i64, _>("total_cents").map_err(db_err)?),
            status: status
                .parse::<OrderStatus>()
                .map_err(StorageError::Backend)?,
            shipping_address: row.try_get("shipping_address").map_err(db_err)?,
            payment_method: row.try_get("payment_method").map_err(db_err)?,
            checkout_key: row.try_get("checkout_key").map_err(db_err)?,
            created_at: row.try_get("created_at").map_err(db_err)?,
            updated_at: row.try_get("updated_at").map_err(db_err)?,
        })
    }

    fn row_to_review(row: PgRow) -> Result<Review, StorageError> {
        Ok(Review {
            id: ReviewId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_err)?),
            product_id: ProductId::from_uuid(
                row.try_get::<Uuid, _>("product_id").map_err(db_err)?,
            ),
            customer_id: CustomerId::from_uuid(
                row.try_get::<Uuid, _>("customer_id").map_err(db_err)?,
            ),
            customer_name: row.try_get("customer_name").map_err(db_err)?,
            rating: row.try_get::<i16, _>("rating").map_err(db_err)? as u8,
            comment: row.try_get("comment").map_err(db_err)?,
            created_at: row.try_get("created_at").map_err(db_err)?,
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, vendor_id, vendor_name, \
     category, images, rating, review_count, approved, featured, stock, created_at";

const ORDER_COLUMNS: &str = "id, customer_id, customer_name, vendor_id, vendor_name, products, \
     total_cents, status, shipping_address, payment_method, checkout_key, created_at, updated_at";

#[async_trait]
impl CatalogStore for PostgresBackend {
    async fn insert_product(&self, product: Product) -> Result<(), StorageError> {
        let images = serde_json::to_value(&product.images)?;
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, vendor_id, vendor_name,
                                  category, images, rating, review_count, approved, featured,
                                  stock, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.vendor_id.as_uuid())
        .bind(&product.vendor_name)
        .bind(product.category.as_str())
        .bind(images)
        .bind(product.rating)
        .bind(product.review_count as i64)
        .bind(product.approved)
        .bind(product.featured)
        .bind(product.stock as i64)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Self::row_to_product).transpose()
    }

    async fn get_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Product>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE vendor_id = $1 ORDER BY created_at DESC"
        ))
        .bind(vendor_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn list_approved(
        &self,
        category: Option<Category>,
    ) -> Result<Vec<Product>, StorageError> {
        let rows = match category {
            Some(category) => {
                sqlx::query(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE approved AND category = $1 ORDER BY created_at DESC"
                ))
                .bind(category.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE approved ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn set_approval(&self, id: ProductId, approved: bool) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE products SET approved = $1 WHERE id = $2")
            .bind(approved)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("product", id));
        }
        Ok(())
    }

    async fn set_featured(&self, id: ProductId, featured: bool) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE products SET featured = $1 WHERE id = $2")
            .bind(featured)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("product", id));
        }
        Ok(())
    }

    async fn update_aggregate(
        &self,
        id: ProductId,
        rating: f64,
        review_count: u64,
    ) -> Result<(), StorageError> {
        let result =
            sqlx::query("UPDATE products SET rating = $1, review_count = $2 WHERE id = $3")
                .bind(rating)
                .bind(review_count as i64)
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("product", id));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresBackend {
    async fn insert_order(&self, order: Order) -> Result<(), StorageError> {
        let products = serde_json::to_value(&order.products)?;
        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, customer_name, vendor_id, vendor_name,
                                products, total_cents, status, shipping_address, payment_method,
                                checkout_key, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(&order.customer_name)
        .bind(order.vendor_id.as_uuid())
        .bind(&order.vendor_name)
        .bind(products)
        .bind(order.total.cents())
        .bind(order.status.as_str())
        .bind(&order.shipping_address)
        .bind(&order.payment_method)
        .bind(&order.checkout_key)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StorageError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE vendor_id = $1 ORDER BY created_at DESC"
        ))
        .bind(vendor_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn find_by_checkout_key(&self, key: &str) -> Result<Option<Order>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE checkout_key = $1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Self::row_to_order).transpose()
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        // Single conditional write; a stale `expected` touches zero rows.
        let result = sqlx::query(
            "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4",
        )
        .bind(new_status.as_str())
        .bind(updated_at)
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;
            return if exists {
                Err(StorageError::conflict("order", id))
            } else {
                Err(StorageError::not_found("order", id))
            };
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for PostgresBackend {
    async fn insert_review(&self, review: Review) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, product_id, customer_id, customer_name, rating, comment,
                                 created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.product_id.as_uuid())
        .bind(review.customer_id.as_uuid())
        .bind(&review.customer_name)
        .bind(review.rating as i16)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_by_product(&self, product_id: ProductId) -> Result<Vec<Review>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, customer_id, customer_name, rating, comment, created_at
            FROM reviews
            WHERE product_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Self::row_to_review).collect()
    }
}
