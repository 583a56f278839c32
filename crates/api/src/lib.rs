//! HTTP API server with observability for the CraftNest marketplace core.
//!
//! Exposes the catalog, order, review, and checkout operations over REST,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use checkout::{CheckoutCoordinator, InMemoryNotificationSink};
use domain::{OrderLedger, ReviewLedger};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::{AppState, Backend};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B: Backend>(state: Arc<AppState<B>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", post(routes::products::create::<B>))
        .route("/products", get(routes::products::list::<B>))
        .route("/products/{id}", get(routes::products::get::<B>))
        .route(
            "/products/vendor/{id}",
            get(routes::products::list_by_vendor::<B>),
        )
        .route(
            "/products/{id}/approval",
            patch(routes::products::set_approval::<B>),
        )
        .route(
            "/products/{id}/featured",
            patch(routes::products::set_featured::<B>),
        )
        .route("/orders", post(routes::orders::create::<B>))
        .route("/orders", get(routes::orders::list::<B>))
        .route("/orders/{id}", get(routes::orders::get::<B>))
        .route(
            "/orders/customer/{id}",
            get(routes::orders::list_by_customer::<B>),
        )
        .route(
            "/orders/vendor/{id}",
            get(routes::orders::list_by_vendor::<B>),
        )
        .route("/orders/{id}/status", patch(routes::orders::update_status::<B>))
        .route("/checkout", post(routes::checkout::run::<B>))
        .route("/reviews", post(routes::reviews::create::<B>))
        .route(
            "/reviews/product/{id}",
            get(routes::reviews::list_by_product::<B>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over the given backend, with an
/// in-memory notification sink.
pub fn create_default_state<B: Backend>(backend: B) -> Arc<AppState<B>> {
    let notifications = InMemoryNotificationSink::new();

    Arc::new(AppState {
        orders: OrderLedger::new(backend.clone(), backend.clone()),
        reviews: ReviewLedger::new(backend.clone(), backend.clone()),
        checkout: CheckoutCoordinator::new(
            backend.clone(),
            backend.clone(),
            notifications.clone(),
        ),
        catalog: backend,
        notifications,
    })
}
