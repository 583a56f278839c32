use common::ProductId;
use domain::storage::StorageError;
use thiserror::Error;

/// Errors that reject a checkout before any order is placed.
///
/// Failures *during* order placement are not errors at this level; they
/// are reported per vendor group in the checkout outcome.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line has quantity zero.
    #[error("cart line for product {product_id} has quantity 0")]
    ZeroQuantity { product_id: ProductId },

    /// A cart line references a product that does not exist.
    #[error("cart references unknown product {product_id}")]
    UnknownProduct { product_id: ProductId },

    /// A cart line asks for more units than the product has in stock.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The underlying store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
