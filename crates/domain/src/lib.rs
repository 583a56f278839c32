//! Domain layer for the CraftNest marketplace core.
//!
//! Owns the entities with actual invariants — orders whose totals must
//! match their line items, the monotonic order status lifecycle, and the
//! product rating aggregate derived from reviews — plus the storage traits
//! the ledger services are written against.

pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod storage;

pub use cart::{Cart, CartLine, VendorGroup};
pub use order::{LineItem, NewOrder, Order, OrderError, OrderLedger, OrderStatus};
pub use product::{Category, Product, RatingSummary};
pub use review::{MIN_COMMENT_LEN, NewReview, Review, ReviewError, ReviewLedger};
pub use storage::{CatalogStore, OrderStore, ReviewStore, StorageError};
