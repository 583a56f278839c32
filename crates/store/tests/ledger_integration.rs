//! Ledger services exercised end to end over the in-memory backend.

use common::{CustomerId, Money, ProductId, VendorId};
use domain::{
    Category, LineItem, NewOrder, NewReview, OrderError, OrderLedger, OrderStatus, Product,
    ReviewError, ReviewLedger,
};
use store::MemoryBackend;

async fn seed_product(backend: &MemoryBackend, vendor_id: VendorId, price_cents: i64) -> Product {
    use domain::storage::CatalogStore;

    let product = Product::new(
        "Stoneware Vase",
        "Hand-thrown stoneware vase",
        Money::from_cents(price_cents),
        vendor_id,
        "Clay & Co",
        Category::Pottery,
        vec![],
        25,
    );
    backend.insert_product(product.clone()).await.unwrap();
    product
}

fn draft_for(product: &Product, quantity: u32) -> NewOrder {
    NewOrder {
        customer_id: CustomerId::new(),
        customer_name: "Ada".to_string(),
        vendor_id: product.vendor_id,
        vendor_name: product.vendor_name.clone(),
        products: vec![LineItem::new(
            product.id,
            product.name.clone(),
            product.price,
            quantity,
        )],
        total: product.price.multiply(quantity),
        shipping_address: "1 Main St, Springfield".to_string(),
        payment_method: "Credit Card".to_string(),
        checkout_key: None,
    }
}

fn review_draft(product_id: ProductId, rating: u8, comment: &str) -> NewReview {
    NewReview {
        product_id,
        customer_id: CustomerId::new(),
        customer_name: "Grace".to_string(),
        rating,
        comment: comment.to_string(),
    }
}

#[tokio::test]
async fn order_walks_full_lifecycle() {
    let backend = MemoryBackend::new();
    let product = seed_product(&backend, VendorId::new(), 2999).await;
    let ledger = OrderLedger::new(backend.clone(), backend.clone());

    let order = ledger.create(draft_for(&product, 2)).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total.cents(), 5998);

    for next in [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let updated = ledger.update_status(order.id, next).await.unwrap();
        assert_eq!(updated.status, next);
    }

    let stored = ledger.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Delivered);
    assert!(stored.updated_at > stored.created_at);
}

#[tokio::test]
async fn skipping_a_state_is_rejected() {
    let backend = MemoryBackend::new();
    let product = seed_product(&backend, VendorId::new(), 1500).await;
    let ledger = OrderLedger::new(backend.clone(), backend.clone());

    let order = ledger.create(draft_for(&product, 1)).await.unwrap();
    let err = ledger
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Shipped,
        }
    ));

    // The failed transition leaves the order untouched.
    let stored = ledger.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[tokio::test]
async fn terminal_order_rejects_further_transitions() {
    let backend = MemoryBackend::new();
    let product = seed_product(&backend, VendorId::new(), 1500).await;
    let ledger = OrderLedger::new(backend.clone(), backend.clone());

    let order = ledger.create(draft_for(&product, 1)).await.unwrap();
    ledger
        .update_status(order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let err = ledger
        .update_status(order.id, OrderStatus::Processing)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
async fn order_for_unknown_product_is_rejected() {
    let backend = MemoryBackend::new();
    let ledger = OrderLedger::new(backend.clone(), backend.clone());

    let phantom = Product::new(
        "Ghost",
        "never inserted",
        Money::from_cents(1000),
        VendorId::new(),
        "Nobody",
        Category::Other,
        vec![],
        1,
    );
    let err = ledger.create(draft_for(&phantom, 1)).await.unwrap_err();
    assert!(matches!(err, OrderError::UnknownProduct { .. }));
}

#[tokio::test]
async fn order_with_foreign_vendor_product_is_rejected() {
    let backend = MemoryBackend::new();
    let product = seed_product(&backend, VendorId::new(), 1000).await;
    let ledger = OrderLedger::new(backend.clone(), backend.clone());

    let mut draft = draft_for(&product, 1);
    draft.vendor_id = VendorId::new();
    let err = ledger.create(draft).await.unwrap_err();
    assert!(matches!(err, OrderError::VendorMismatch { .. }));
    assert_eq!(backend.order_count().await, 0);
}

#[tokio::test]
async fn review_updates_product_aggregate() {
    let backend = MemoryBackend::new();
    let product = seed_product(&backend, VendorId::new(), 2999).await;
    let ledger = ReviewLedger::new(backend.clone(), backend.clone());

    ledger
        .create(review_draft(product.id, 5, "Beautiful glaze, fast shipping"))
        .await
        .unwrap();
    let stored = fetch_product(&backend, product.id).await;
    assert_eq!(stored.rating, 5.0);
    assert_eq!(stored.review_count, 1);

    ledger
        .create(review_draft(product.id, 3, "Smaller than it looked"))
        .await
        .unwrap();
    let stored = fetch_product(&backend, product.id).await;
    assert_eq!(stored.rating, 4.0);
    assert_eq!(stored.review_count, 2);
}

#[tokio::test]
async fn review_locks_are_released_after_create() {
    let backend = MemoryBackend::new();
    let first = seed_product(&backend, VendorId::new(), 2999).await;
    let second = seed_product(&backend, VendorId::new(), 1500).await;
    let ledger = ReviewLedger::new(backend.clone(), backend.clone());

    ledger
        .create(review_draft(first.id, 5, "Exactly as pictured"))
        .await
        .unwrap();
    ledger
        .create(review_draft(second.id, 4, "Sturdy and well made"))
        .await
        .unwrap();

    // The per-product lock map does not accumulate an entry per product.
    assert_eq!(ledger.lock_count(), 0);

    // A failed create releases its entry too.
    backend.set_fail_aggregate_writes(true);
    ledger
        .create(review_draft(first.id, 2, "Arrived chipped"))
        .await
        .unwrap_err();
    assert_eq!(ledger.lock_count(), 0);
}

#[tokio::test]
async fn invalid_reviews_leave_aggregate_untouched() {
    let backend = MemoryBackend::new();
    let product = seed_product(&backend, VendorId::new(), 2999).await;
    let ledger = ReviewLedger::new(backend.clone(), backend.clone());

    let err = ledger
        .create(review_draft(product.id, 6, "Off the charts"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::RatingOutOfRange { rating: 6 }));

    let err = ledger
        .create(review_draft(product.id, 4, "ok!"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::CommentTooShort { len: 3, .. }));

    let stored = fetch_product(&backend, product.id).await;
    assert_eq!(stored.rating, 0.0);
    assert_eq!(stored.review_count, 0);
    assert_eq!(backend.review_count().await, 0);
}

#[tokio::test]
async fn review_for_unknown_product_is_rejected() {
    let backend = MemoryBackend::new();
    let ledger = ReviewLedger::new(backend.clone(), backend.clone());

    let err = ledger
        .create(review_draft(ProductId::new(), 4, "Nice enough"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::UnknownProduct(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_reviews_do_not_lose_an_update() {
    let backend = MemoryBackend::new();
    let product = seed_product(&backend, VendorId::new(), 2999).await;
    let ledger = ReviewLedger::new(backend.clone(), backend.clone());

    let (a, b) = tokio::join!(
        ledger.create(review_draft(product.id, 5, "Exactly as pictured")),
        ledger.create(review_draft(product.id, 1, "Arrived chipped")),
    );
    a.unwrap();
    b.unwrap();

    let stored = fetch_product(&backend, product.id).await;
    assert_eq!(stored.review_count, 2);
    assert_eq!(stored.rating, 3.0);
    assert_eq!(ledger.lock_count(), 0);
}

#[tokio::test]
async fn failed_aggregate_write_rolls_back_the_review() {
    let backend = MemoryBackend::new();
    let product = seed_product(&backend, VendorId::new(), 2999).await;
    let ledger = ReviewLedger::new(backend.clone(), backend.clone());

    backend.set_fail_aggregate_writes(true);
    let err = ledger
        .create(review_draft(product.id, 5, "Beautiful glaze"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::Storage(_)));

    // The compensating delete removed the orphaned review.
    assert_eq!(backend.review_count().await, 0);
    let stored = fetch_product(&backend, product.id).await;
    assert_eq!(stored.rating, 0.0);
    assert_eq!(stored.review_count, 0);

    // Recovery: once writes succeed again the review goes through.
    backend.set_fail_aggregate_writes(false);
    ledger
        .create(review_draft(product.id, 5, "Beautiful glaze"))
        .await
        .unwrap();
    let stored = fetch_product(&backend, product.id).await;
    assert_eq!(stored.review_count, 1);
}

#[tokio::test]
async fn direct_status_write_respects_concurrent_change() {
    use domain::storage::{OrderStore, StorageError};

    let backend = MemoryBackend::new();
    let product = seed_product(&backend, VendorId::new(), 1000).await;
    let ledger = OrderLedger::new(backend.clone(), backend.clone());
    let order = ledger.create(draft_for(&product, 1)).await.unwrap();

    // Another actor moves the order first.
    ledger
        .update_status(order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    // A stale compare-and-set loses cleanly.
    let err = backend
        .update_status(
            order.id,
            OrderStatus::Pending,
            OrderStatus::Processing,
            chrono::Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict { .. }));

    let stored = ledger.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);
}

async fn fetch_product(backend: &MemoryBackend, id: ProductId) -> Product {
    use domain::storage::CatalogStore;
    backend.get_product(id).await.unwrap().unwrap()
}
