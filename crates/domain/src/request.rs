//! Order creation request types.

use common::{CustomerId, Money, ProductId};
use serde::{Deserialize, Serialize};

/// Largest quantity accepted on a single line. Matches the storage
/// column's signed 32-bit range so an oversized request is rejected up
/// front instead of failing inside the transaction.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// A requested sale.
///
/// `total_amount` is the caller's declared total; it is persisted as
/// supplied and not validated against the line-item sum (see DESIGN.md).
/// Any caller-supplied creation date is ignored; the service stamps the
/// order with the current time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub customer_id: CustomerId,
    pub description: Option<String>,
    pub total_amount: Money,
    pub status: String,
    pub payment_method: String,
    pub lines: Vec<LineRequest>,
}

/// One requested line: product, quantity, and the unit price agreed at
/// the till (not derived from the catalog's sale price).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}
