//! Route handlers and shared application state.

pub mod checkout;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod reviews;

use ::checkout::{CheckoutCoordinator, InMemoryNotificationSink};
use domain::{
    OrderLedger, ReviewLedger,
    storage::{CatalogStore, OrderStore, ReviewStore},
};

/// Everything a storage backend must provide to back the API.
pub trait Backend:
    CatalogStore + OrderStore + ReviewStore + Clone + Send + Sync + 'static
{
}

impl<T> Backend for T where T: CatalogStore + OrderStore + ReviewStore + Clone + Send + Sync + 'static
{}

/// Shared application state accessible from all handlers.
pub struct AppState<B: Backend> {
    pub orders: OrderLedger<B, B>,
    pub reviews: ReviewLedger<B, B>,
    pub checkout: CheckoutCoordinator<B, B, InMemoryNotificationSink>,
    pub catalog: B,
    pub notifications: InMemoryNotificationSink,
}
