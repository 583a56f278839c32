//! Review ledger service: review storage and aggregate maintenance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use common::ProductId;

use crate::product::RatingSummary;
use crate::storage::{CatalogStore, ReviewStore, StorageError};

use super::{NewReview, Review, ReviewError};

/// Owns review creation and the product rating aggregate.
///
/// Creating a review and recomputing the owning product's mean rating and
/// review count form one logical unit: the recompute reads the review set
/// *after* the insert is durably visible, and a failed aggregate write
/// compensates by deleting the just-inserted review. Recomputing from a
/// possibly-stale in-memory list is exactly the inconsistency this service
/// exists to prevent.
pub struct ReviewLedger<S, C> {
    store: S,
    catalog: C,
    /// Per-product critical sections serializing the read-then-write of
    /// the aggregate, so two back-to-back reviews never lose an update.
    locks: Mutex<HashMap<ProductId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S, C> ReviewLedger<S, C>
where
    S: ReviewStore,
    C: CatalogStore,
{
    /// Creates a ledger over the given stores.
    pub fn new(store: S, catalog: C) -> Self {
        Self {
            store,
            catalog,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn product_lock(&self, product_id: ProductId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("review lock map poisoned");
        locks
            .entry(product_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drops our clone of a product lock and evicts the map entry once
    /// nothing else references it. Waiters hold their own clone, so a
    /// strong count of 1 under the map mutex means only the map does.
    fn prune_lock(&self, product_id: ProductId, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().expect("review lock map poisoned");
        drop(lock);
        if let Some(entry) = locks.get(&product_id) {
            if Arc::strong_count(entry) == 1 {
                locks.remove(&product_id);
            }
        }
    }

    /// Number of per-product lock entries currently held.
    pub fn lock_count(&self) -> usize {
        self.locks.lock().expect("review lock map poisoned").len()
    }

    /// Validates and persists a review, then recomputes the product's
    /// rating aggregate.
    #[tracing::instrument(skip(self, draft), fields(product_id = %draft.product_id))]
    pub async fn create(&self, draft: NewReview) -> Result<Review, ReviewError> {
        draft.validate()?;

        let product_id = draft.product_id;
        self.catalog
            .get_product(product_id)
            .await?
            .ok_or(ReviewError::UnknownProduct(product_id))?;

        let lock = self.product_lock(product_id);
        let result = {
            let _guard = lock.lock().await;
            self.insert_and_recompute(draft).await
        };
        self.prune_lock(product_id, lock);
        result
    }

    /// Insert plus aggregate recompute, compensating the insert when the
    /// aggregate write fails. Must be called with the product's lock held.
    async fn insert_and_recompute(&self, draft: NewReview) -> Result<Review, ReviewError> {
        let product_id = draft.product_id;
        let review = Review::from_draft(draft, Utc::now())?;
        self.store.insert_review(review.clone()).await?;

        match self.recompute_aggregate(product_id).await {
            Ok(summary) => {
                metrics::counter!("reviews_created_total").increment(1);
                tracing::info!(
                    review_id = %review.id,
                    rating = summary.rating,
                    review_count = summary.review_count,
                    "review created, aggregate updated"
                );
                Ok(review)
            }
            Err(err) => {
                // The review row must not outlive a failed aggregate write.
                if let Err(delete_err) = self.store.delete_review(review.id).await {
                    tracing::error!(
                        review_id = %review.id,
                        error = %delete_err,
                        "failed to compensate review insert"
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Returns a product's reviews, newest first.
    pub async fn get_by_product(&self, product_id: ProductId) -> Result<Vec<Review>, StorageError> {
        self.store.list_by_product(product_id).await
    }

    /// Recomputes mean/count from the full review set and writes it onto
    /// the product row. Must be called with the product's lock held.
    async fn recompute_aggregate(
        &self,
        product_id: ProductId,
    ) -> Result<RatingSummary, StorageError> {
        let ratings: Vec<u8> = self
            .store
            .list_by_product(product_id)
            .await?
            .iter()
            .map(|r| r.rating)
            .collect();

        let summary = RatingSummary::from_ratings(&ratings);
        self.catalog
            .update_aggregate(product_id, summary.rating, summary.review_count)
            .await?;
        Ok(summary)
    }
}
