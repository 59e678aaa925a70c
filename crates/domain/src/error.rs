//! Domain error types.

use common::{CustomerId, ProductId};
use store::StoreError;
use thiserror::Error;

/// Closed set of failures for order operations.
///
/// The first five variants mean the request itself was bad and can be
/// retried with different input; [`OrderError::Store`] means the storage
/// layer could not commit and the request may be retried later. Every
/// variant aborts the order-creation transaction, rolling back any stock
/// debit already applied within it.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request carried no line items.
    #[error("order must contain at least one line item")]
    EmptyOrder,

    /// A line requested a quantity outside `1..=MAX_LINE_QUANTITY`.
    #[error(
        "invalid quantity for product {product_id}: must be between 1 and {}",
        crate::request::MAX_LINE_QUANTITY
    )]
    InvalidQuantity { product_id: ProductId },

    /// The referenced customer does not exist. No mutation has occurred.
    #[error("customer not found: {customer_id}")]
    CustomerNotFound { customer_id: CustomerId },

    /// A referenced product does not exist.
    #[error("product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// Requested quantity exceeds known stock, or stock is untracked.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {}",
        .available.map_or_else(|| "untracked".to_string(), |a| a.to_string())
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        /// Known stock at validation time; `None` if untracked.
        available: Option<i64>,
    },

    /// The storage layer failed to commit.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    /// For [`OrderError::InsufficientStock`], the number of units short.
    pub fn shortfall(&self) -> Option<i64> {
        match self {
            OrderError::InsufficientStock {
                requested,
                available,
                ..
            } => Some(i64::from(*requested) - available.unwrap_or(0)),
            _ => None,
        }
    }

    /// True if retrying with different input could succeed; false if the
    /// failure is on the storage side and a later retry may succeed as is.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, OrderError::Store(_))
    }
}
