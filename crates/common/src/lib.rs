//! Shared types for the point-of-sale backend.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{CustomerId, LineItemId, OrderId, ProductId, ServiceId};
