//! Review endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{CustomerId, ProductId, ReviewId};
use domain::{NewReview, Review};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::Json;

use super::{AppState, Backend};

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub rating: u8,
    pub comment: String,
}

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            customer_id: r.customer_id,
            customer_name: r.customer_name,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

/// POST /reviews — create a review and refresh the product's rating.
#[tracing::instrument(skip(state, req))]
pub async fn create<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let review = state
        .reviews
        .create(NewReview {
            product_id: req.product_id,
            customer_id: req.customer_id,
            customer_name: req.customer_name,
            rating: req.rating,
            comment: req.comment,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(review.into())))
}

/// GET /reviews/product/:id — list a product's reviews, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_by_product<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let reviews = state.reviews.get_by_product(id).await?;
    Ok(Json(reviews.into_iter().map(Into::into).collect()))
}
