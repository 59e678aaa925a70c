//! Order service: the order-creation transaction and aggregate lifecycle.

use chrono::{DateTime, Utc};
use common::OrderId;
use store::{
    CatalogStore, CustomerDirectory, NewLineItem, NewOrder, Order, OrderRepository, StockDebit,
};

use crate::error::OrderError;
use crate::report::RevenueReport;
use crate::request::{CreateOrder, MAX_LINE_QUANTITY};

/// Orchestrates order creation against its three storage collaborators:
/// the product catalog, the customer directory, and the order repository.
///
/// Collaborators are constructor-supplied; the catalog and repository must
/// share a transaction type so that stock debits and the aggregate insert
/// commit or roll back as one unit.
pub struct OrderService<C, D, R> {
    catalog: C,
    customers: D,
    orders: R,
}

impl<C, D, R> OrderService<C, D, R>
where
    C: CatalogStore,
    D: CustomerDirectory,
    R: OrderRepository<Tx = C::Tx>,
{
    /// Creates a new order service with the given collaborators.
    pub fn new(catalog: C, customers: D, orders: R) -> Self {
        Self {
            catalog,
            customers,
            orders,
        }
    }

    /// Creates and persists a sales order.
    ///
    /// Resolves the customer, then runs one all-or-nothing transaction:
    /// per line, a conditional stock debit; then the aggregate insert.
    /// Any failure after the first debit rolls every debit back - the
    /// catalog never retains a debit for an order that did not commit.
    ///
    /// The returned order carries storage-assigned ids for the header and
    /// every line, and a creation timestamp stamped here rather than taken
    /// from the caller.
    #[tracing::instrument(
        skip(self, req),
        fields(customer_id = %req.customer_id, lines = req.lines.len())
    )]
    pub async fn create_order(&self, req: CreateOrder) -> Result<Order, OrderError> {
        if req.lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        for line in &req.lines {
            if line.quantity == 0 || line.quantity > MAX_LINE_QUANTITY {
                return Err(OrderError::InvalidQuantity {
                    product_id: line.product_id,
                });
            }
        }

        let customer = self
            .customers
            .find_by_id(req.customer_id)
            .await?
            .ok_or(OrderError::CustomerNotFound {
                customer_id: req.customer_id,
            })?;

        let started = std::time::Instant::now();
        let mut tx = self.orders.begin().await?;

        let mut lines = Vec::with_capacity(req.lines.len());
        for line in &req.lines {
            // Early returns drop `tx`, rolling back debits already staged.
            match self
                .catalog
                .debit_stock(&mut tx, line.product_id, line.quantity)
                .await?
            {
                StockDebit::Applied { remaining } => {
                    tracing::debug!(product_id = %line.product_id, remaining, "stock debited");
                    lines.push(NewLineItem {
                        product_id: line.product_id,
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                    });
                }
                StockDebit::Insufficient { available } => {
                    return Err(OrderError::InsufficientStock {
                        product_id: line.product_id,
                        requested: line.quantity,
                        available,
                    });
                }
                StockDebit::ProductMissing => {
                    return Err(OrderError::ProductNotFound {
                        product_id: line.product_id,
                    });
                }
            }
        }

        let order = self
            .orders
            .insert(
                &mut tx,
                NewOrder {
                    customer_id: customer.id,
                    description: req.description,
                    total_amount: req.total_amount,
                    created_at: Utc::now(),
                    status: req.status,
                    payment_method: req.payment_method,
                    lines,
                },
            )
            .await?;
        self.orders.commit(tx).await?;

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, "order created");

        Ok(order)
    }

    /// Loads an order with its line items. Absent is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Option<Order>, OrderError> {
        Ok(self.orders.find_by_id(id).await?)
    }

    /// Lists every order with its line items.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.find_all().await?)
    }

    /// Deletes an order and, through aggregate ownership, all of its line
    /// items. Returns false if no such order existed.
    ///
    /// Stock debited when the order was created is not restored; see
    /// DESIGN.md for the sign-off on this legacy behavior.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, id: OrderId) -> Result<bool, OrderError> {
        let deleted = self.orders.delete_by_id(id).await?;
        if deleted {
            metrics::counter!("orders_deleted_total").increment(1);
            tracing::info!(order_id = %id, "order deleted");
        }
        Ok(deleted)
    }

    /// Revenue of committed sales within `[start, end]`, grouped by
    /// payment method.
    #[tracing::instrument(skip(self))]
    pub async fn revenue_report(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<RevenueReport, OrderError> {
        let rows = self.orders.revenue_by_payment_method(start, end).await?;
        Ok(RevenueReport::from_totals(rows))
    }
}
