//! Product catalog endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Money, ProductId, VendorId};
use domain::{Category, Product};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::Json;

use super::{AppState, Backend};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    /// Price in decimal dollars.
    pub price: f64,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub category: Category,
    #[serde(default)]
    pub images: Vec<String>,
    pub stock: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<Category>,
}

#[derive(Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

#[derive(Deserialize)]
pub struct FeaturedRequest {
    pub featured: bool,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub category: Category,
    pub images: Vec<String>,
    pub rating: f64,
    pub review_count: u64,
    pub approved: bool,
    pub featured: bool,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price.as_f64(),
            vendor_id: p.vendor_id,
            vendor_name: p.vendor_name,
            category: p.category,
            images: p.images,
            rating: p.rating,
            review_count: p.review_count,
            approved: p.approved,
            featured: p.featured,
            stock: p.stock,
            created_at: p.created_at,
        }
    }
}

// -- Handlers --

/// POST /products — upload a new product (starts unapproved).
#[tracing::instrument(skip(state, req))]
pub async fn create<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let price = Money::from_dollars_f64(req.price);
    if price.is_negative() {
        return Err(ApiError::BadRequest("price must not be negative".to_string()));
    }

    let product = Product::new(
        req.name,
        req.description,
        price,
        req.vendor_id,
        req.vendor_name,
        req.category,
        req.images,
        req.stock,
    );
    state.catalog.insert_product(product.clone()).await?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /products — list approved products, optionally filtered by category.
#[tracing::instrument(skip(state))]
pub async fn list<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.list_approved(query.category).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/:id — load a product by ID.
#[tracing::instrument(skip(state))]
pub async fn get<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .catalog
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product.into()))
}

/// GET /products/vendor/:id — list a vendor's products, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_by_vendor<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<VendorId>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.get_by_vendor(id).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// PATCH /products/:id/approval — set the admin approval flag.
#[tracing::instrument(skip(state, req))]
pub async fn set_approval<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<ProductId>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    state.catalog.set_approval(id, req.approved).await?;
    let product = state
        .catalog
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product.into()))
}

/// PATCH /products/:id/featured — set the featured flag.
#[tracing::instrument(skip(state, req))]
pub async fn set_featured<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<ProductId>,
    Json(req): Json<FeaturedRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    state.catalog.set_featured(id, req.featured).await?;
    let product = state
        .catalog
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product.into()))
}
