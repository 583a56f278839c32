//! Shared types for the CraftNest marketplace core.

mod ids;
mod money;
mod role;

pub use ids::{CustomerId, OrderId, ProductId, ReviewId, VendorId};
pub use money::Money;
pub use role::Role;
