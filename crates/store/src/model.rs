//! Persisted entity types.

use chrono::{DateTime, Utc};
use common::{CustomerId, LineItemId, Money, OrderId, ProductId, ServiceId};
use serde::{Deserialize, Serialize};

/// Status value written by the front office for committed sales. The
/// revenue report only aggregates orders carrying this status.
pub const STATUS_COMPLETED: &str = "FINALIZADA";

/// A customer on record. Read-only from the order core's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

/// Insert shape for a customer; the id is assigned on persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

/// A product in the catalog.
///
/// `stock_quantity` is the one piece of shared mutable state the order
/// core writes. `None` means stock is not tracked for this product; such
/// products cannot be sold until a quantity is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub cost_price: Option<Money>,
    pub sale_price: Option<Money>,
    pub stock_quantity: Option<i64>,
}

/// Insert shape for a product; the id is assigned on persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub cost_price: Option<Money>,
    pub sale_price: Option<Money>,
    pub stock_quantity: Option<i64>,
}

/// An offered service (installation, repair, delivery). Catalog data
/// only; services carry a base price for quoting and do not participate
/// in stock tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: ServiceId,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Option<Money>,
    pub category: Option<String>,
}

/// Insert shape for a service; the id is assigned on persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServiceOffering {
    pub name: String,
    pub description: Option<String>,
    pub base_price: Option<Money>,
    pub category: Option<String>,
}

/// One product/quantity/price entry within an order.
///
/// Line items are exclusively owned by their order: created with it and
/// deleted with it. The unit price is the one supplied by the caller at
/// creation time, never recomputed from the product's sale price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// A committed sale: header plus owned line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub description: Option<String>,
    /// Caller-declared total. Not validated against the line-item sum;
    /// see DESIGN.md.
    pub total_amount: Money,
    /// Stamped by the order service at creation time.
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub payment_method: String,
    pub customer_id: CustomerId,
    pub lines: Vec<LineItem>,
}

/// Insert shape for a line item within a [`NewOrder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Insert shape for an order aggregate. Order and line-item ids are
/// assigned on persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub description: Option<String>,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub payment_method: String,
    pub lines: Vec<NewLineItem>,
}

/// One row of the revenue report: committed-sale total per payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodTotal {
    pub payment_method: String,
    pub total: Money,
}
