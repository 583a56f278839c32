//! PostgreSQL backend integration tests.
//!
//! A single container is shared across the whole test binary; each test
//! opens its own pool, truncates the tables, and runs serialized.

use std::sync::Arc;

use chrono::Utc;
use common::{CustomerId, Money, ProductId, VendorId};
use domain::{
    Category, LineItem, NewOrder, NewReview, Order, OrderStatus, Product, Review,
    storage::{CatalogStore, OrderStore, ReviewStore, StorageError},
};
use serial_test::serial;
use sqlx::PgPool;
use store::PostgresBackend;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresBackend::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Gets a fresh backend with its own pool and cleared tables.
async fn get_test_backend() -> PostgresBackend {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE reviews, orders, products")
        .execute(&pool)
        .await
        .unwrap();

    PostgresBackend::new(pool)
}

fn test_product(vendor_id: VendorId) -> Product {
    Product::new(
        "Stoneware Vase",
        "Hand-thrown stoneware vase",
        Money::from_cents(2999),
        vendor_id,
        "Clay & Co",
        Category::Pottery,
        vec!["https://img.example/vase.jpg".to_string()],
        25,
    )
}

fn test_order(product: &Product, checkout_key: Option<&str>) -> Order {
    let draft = NewOrder {
        customer_id: CustomerId::new(),
        customer_name: "Ada".to_string(),
        vendor_id: product.vendor_id,
        vendor_name: product.vendor_name.clone(),
        products: vec![LineItem::new(
            product.id,
            product.name.clone(),
            product.price,
            2,
        )],
        total: product.price.multiply(2),
        shipping_address: "1 Main St, Springfield".to_string(),
        payment_method: "Credit Card".to_string(),
        checkout_key: checkout_key.map(str::to_string),
    };
    Order::from_draft(draft, Utc::now()).unwrap()
}

fn test_review(product_id: ProductId, rating: u8) -> Review {
    let draft = NewReview {
        product_id,
        customer_id: CustomerId::new(),
        customer_name: "Grace".to_string(),
        rating,
        comment: "Beautiful craftsmanship".to_string(),
    };
    Review::from_draft(draft, Utc::now()).unwrap()
}

#[tokio::test]
#[serial]
async fn product_roundtrip() {
    let backend = get_test_backend().await;
    let product = test_product(VendorId::new());

    backend.insert_product(product.clone()).await.unwrap();

    let stored = backend.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.name, product.name);
    assert_eq!(stored.price, product.price);
    assert_eq!(stored.category, Category::Pottery);
    assert_eq!(stored.images, product.images);
    assert!(!stored.approved);
}

#[tokio::test]
#[serial]
async fn missing_product_is_none() {
    let backend = get_test_backend().await;
    assert!(
        backend
            .get_product(ProductId::new())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[serial]
async fn list_approved_filters_by_category() {
    let backend = get_test_backend().await;
    let vendor = VendorId::new();

    let mut pottery = test_product(vendor);
    pottery.approved = true;
    let mut jewelry = test_product(vendor);
    jewelry.category = Category::Jewelry;
    jewelry.approved = true;
    let unapproved = test_product(vendor);

    backend.insert_product(pottery.clone()).await.unwrap();
    backend.insert_product(jewelry.clone()).await.unwrap();
    backend.insert_product(unapproved).await.unwrap();

    let all = backend.list_approved(None).await.unwrap();
    assert_eq!(all.len(), 2);

    let only_pottery = backend.list_approved(Some(Category::Pottery)).await.unwrap();
    assert_eq!(only_pottery.len(), 1);
    assert_eq!(only_pottery[0].id, pottery.id);
}

#[tokio::test]
#[serial]
async fn approval_flag_updates() {
    let backend = get_test_backend().await;
    let product = test_product(VendorId::new());
    backend.insert_product(product.clone()).await.unwrap();

    backend.set_approval(product.id, true).await.unwrap();
    assert!(backend.get_product(product.id).await.unwrap().unwrap().approved);

    let err = backend.set_approval(ProductId::new(), true).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
#[serial]
async fn aggregate_write_updates_product_row() {
    let backend = get_test_backend().await;
    let product = test_product(VendorId::new());
    backend.insert_product(product.clone()).await.unwrap();

    backend.update_aggregate(product.id, 4.5, 2).await.unwrap();

    let stored = backend.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.rating, 4.5);
    assert_eq!(stored.review_count, 2);
}

#[tokio::test]
#[serial]
async fn order_roundtrip_preserves_line_items() {
    let backend = get_test_backend().await;
    let product = test_product(VendorId::new());
    backend.insert_product(product.clone()).await.unwrap();

    let order = test_order(&product, None);
    backend.insert_order(order.clone()).await.unwrap();

    let stored = backend.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.products, order.products);
    assert_eq!(stored.total, order.total);
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(stored.checkout_key, None);
}

#[tokio::test]
#[serial]
async fn orders_list_newest_first() {
    let backend = get_test_backend().await;
    let product = test_product(VendorId::new());
    backend.insert_product(product.clone()).await.unwrap();

    let mut first = test_order(&product, None);
    let mut second = test_order(&product, None);
    second.created_at = first.created_at + chrono::Duration::seconds(10);
    second.updated_at = second.created_at;
    first.customer_id = second.customer_id;

    backend.insert_order(first.clone()).await.unwrap();
    backend.insert_order(second.clone()).await.unwrap();

    let all = backend.list_orders().await.unwrap();
    assert_eq!(all[0].id, second.id);
    assert_eq!(all[1].id, first.id);

    let by_customer = backend.list_by_customer(first.customer_id).await.unwrap();
    assert_eq!(by_customer.len(), 2);
    assert_eq!(by_customer[0].id, second.id);

    let by_vendor = backend.list_by_vendor(product.vendor_id).await.unwrap();
    assert_eq!(by_vendor.len(), 2);
}

#[tokio::test]
#[serial]
async fn checkout_key_lookup() {
    let backend = get_test_backend().await;
    let product = test_product(VendorId::new());
    backend.insert_product(product.clone()).await.unwrap();

    let order = test_order(&product, Some("ck-123:vendor-a"));
    backend.insert_order(order.clone()).await.unwrap();

    let found = backend
        .find_by_checkout_key("ck-123:vendor-a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, order.id);

    assert!(
        backend
            .find_by_checkout_key("ck-999:vendor-a")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[serial]
async fn status_compare_and_set() {
    let backend = get_test_backend().await;
    let product = test_product(VendorId::new());
    backend.insert_product(product.clone()).await.unwrap();

    let order = test_order(&product, None);
    backend.insert_order(order.clone()).await.unwrap();

    backend
        .update_status(
            order.id,
            OrderStatus::Pending,
            OrderStatus::Processing,
            Utc::now(),
        )
        .await
        .unwrap();

    // Stale expected status loses.
    let err = backend
        .update_status(
            order.id,
            OrderStatus::Pending,
            OrderStatus::Cancelled,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict { .. }));

    let stored = backend.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Processing);
}

#[tokio::test]
#[serial]
async fn status_update_for_unknown_order_is_not_found() {
    let backend = get_test_backend().await;

    let err = backend
        .update_status(
            common::OrderId::new(),
            OrderStatus::Pending,
            OrderStatus::Processing,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
#[serial]
async fn review_insert_delete_and_list() {
    let backend = get_test_backend().await;
    let product = test_product(VendorId::new());
    backend.insert_product(product.clone()).await.unwrap();

    let first = test_review(product.id, 5);
    let mut second = test_review(product.id, 3);
    second.created_at = first.created_at + chrono::Duration::seconds(10);

    backend.insert_review(first.clone()).await.unwrap();
    backend.insert_review(second.clone()).await.unwrap();

    let reviews = backend.list_by_product(product.id).await.unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].id, second.id);
    assert_eq!(reviews[0].rating, 3);

    backend.delete_review(second.id).await.unwrap();
    let reviews = backend.list_by_product(product.id).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].id, first.id);
}

#[tokio::test]
#[serial]
async fn duplicate_checkout_key_is_rejected() {
    let backend = get_test_backend().await;
    let product = test_product(VendorId::new());
    backend.insert_product(product.clone()).await.unwrap();

    let first = test_order(&product, Some("ck-dup:vendor"));
    let second = test_order(&product, Some("ck-dup:vendor"));

    backend.insert_order(first).await.unwrap();
    let result = backend.insert_order(second).await;
    assert!(matches!(result, Err(StorageError::Backend(_))));
}
