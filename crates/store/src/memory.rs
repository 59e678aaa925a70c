//! In-memory storage implementation for testing.
//!
//! One [`MemoryStore`] implements all three collaborator traits over a
//! single shared state. Transactions take an exclusive guard over that
//! state and work on a scratch copy: commit writes the copy back, dropping
//! the transaction discards it. The exclusive guard makes concurrent
//! order-creation requests serializable, so the same no-oversell guarantee
//! holds as with the conditional decrement in PostgreSQL.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId, ServiceId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::model::{
    Customer, LineItem, NewCustomer, NewOrder, NewProduct, NewServiceOffering, Order,
    PaymentMethodTotal, Product, STATUS_COMPLETED, ServiceOffering,
};
use crate::repository::{
    CatalogStore, CustomerDirectory, OrderRepository, ServiceCatalog, StockDebit,
};
use crate::{Result, StoreError};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    customers: HashMap<CustomerId, Customer>,
    products: HashMap<ProductId, Product>,
    services: HashMap<ServiceId, ServiceOffering>,
    orders: BTreeMap<OrderId, Order>,
    next_customer_id: i64,
    next_product_id: i64,
    next_service_id: i64,
    next_order_id: i64,
    next_line_item_id: i64,
}

/// In-memory store implementing all three storage collaborators.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_next_commit: Arc<AtomicBool>,
}

/// Transaction handle for the in-memory store.
///
/// Holds the state lock for its whole lifetime; mutations go to `scratch`
/// and only land in the shared state on commit.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    scratch: MemoryState,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next transaction commit fail with
    /// [`StoreError::Unavailable`]. Used to exercise rollback paths.
    pub fn set_fail_next_commit(&self, fail: bool) {
        self.fail_next_commit.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

#[async_trait]
impl CustomerDirectory for MemoryStore {
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.state.lock().await.customers.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Customer>> {
        let mut customers: Vec<Customer> =
            self.state.lock().await.customers.values().cloned().collect();
        customers.sort_by_key(|c| c.id);
        Ok(customers)
    }

    async fn insert(&self, customer: NewCustomer) -> Result<Customer> {
        let mut state = self.state.lock().await;
        state.next_customer_id += 1;
        let customer = Customer {
            id: CustomerId::new(state.next_customer_id),
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            address: customer.address,
            tax_id: customer.tax_id,
        };
        state.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn update(&self, customer: Customer) -> Result<Option<Customer>> {
        let mut state = self.state.lock().await;
        if !state.customers.contains_key(&customer.id) {
            return Ok(None);
        }
        state.customers.insert(customer.id, customer.clone());
        Ok(Some(customer))
    }

    async fn delete_by_id(&self, id: CustomerId) -> Result<bool> {
        Ok(self.state.lock().await.customers.remove(&id).is_some())
    }
}

#[async_trait]
impl ServiceCatalog for MemoryStore {
    async fn find_by_id(&self, id: ServiceId) -> Result<Option<ServiceOffering>> {
        Ok(self.state.lock().await.services.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<ServiceOffering>> {
        let mut services: Vec<ServiceOffering> =
            self.state.lock().await.services.values().cloned().collect();
        services.sort_by_key(|s| s.id);
        Ok(services)
    }

    async fn insert(&self, service: NewServiceOffering) -> Result<ServiceOffering> {
        let mut state = self.state.lock().await;
        state.next_service_id += 1;
        let service = ServiceOffering {
            id: ServiceId::new(state.next_service_id),
            name: service.name,
            description: service.description,
            base_price: service.base_price,
            category: service.category,
        };
        state.services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn update(&self, service: ServiceOffering) -> Result<Option<ServiceOffering>> {
        let mut state = self.state.lock().await;
        if !state.services.contains_key(&service.id) {
            return Ok(None);
        }
        state.services.insert(service.id, service.clone());
        Ok(Some(service))
    }

    async fn delete_by_id(&self, id: ServiceId) -> Result<bool> {
        Ok(self.state.lock().await.services.remove(&id).is_some())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    type Tx = MemoryTx;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> =
            self.state.lock().await.products.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn insert(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.lock().await;
        state.next_product_id += 1;
        let product = Product {
            id: ProductId::new(state.next_product_id),
            name: product.name,
            description: product.description,
            cost_price: product.cost_price,
            sale_price: product.sale_price,
            stock_quantity: product.stock_quantity,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(&self, product: Product) -> Result<Option<Product>> {
        let mut state = self.state.lock().await;
        if !state.products.contains_key(&product.id) {
            return Ok(None);
        }
        state.products.insert(product.id, product.clone());
        Ok(Some(product))
    }

    async fn delete_by_id(&self, id: ProductId) -> Result<bool> {
        Ok(self.state.lock().await.products.remove(&id).is_some())
    }

    async fn debit_stock(
        &self,
        tx: &mut MemoryTx,
        id: ProductId,
        quantity: u32,
    ) -> Result<StockDebit> {
        let Some(product) = tx.scratch.products.get_mut(&id) else {
            return Ok(StockDebit::ProductMissing);
        };

        match product.stock_quantity {
            None => Ok(StockDebit::Insufficient { available: None }),
            Some(available) if available < i64::from(quantity) => Ok(StockDebit::Insufficient {
                available: Some(available),
            }),
            Some(available) => {
                let remaining = available - i64::from(quantity);
                product.stock_quantity = Some(remaining);
                Ok(StockDebit::Applied { remaining })
            }
        }
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        let scratch = guard.clone();
        Ok(MemoryTx { guard, scratch })
    }

    async fn commit(&self, tx: MemoryTx) -> Result<()> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }
        let MemoryTx { mut guard, scratch } = tx;
        *guard = scratch;
        Ok(())
    }

    async fn insert(&self, tx: &mut MemoryTx, order: NewOrder) -> Result<Order> {
        tx.scratch.next_order_id += 1;
        let order_id = OrderId::new(tx.scratch.next_order_id);

        let mut lines = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            tx.scratch.next_line_item_id += 1;
            lines.push(LineItem {
                id: tx.scratch.next_line_item_id.into(),
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        let order = Order {
            id: order_id,
            description: order.description,
            total_amount: order.total_amount,
            created_at: order.created_at,
            status: order.status,
            payment_method: order.payment_method,
            customer_id: order.customer_id,
            lines,
        };
        tx.scratch.orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Order>> {
        Ok(self.state.lock().await.orders.values().cloned().collect())
    }

    async fn delete_by_id(&self, id: OrderId) -> Result<bool> {
        // The aggregate owns its lines, so removing the order removes them.
        Ok(self.state.lock().await.orders.remove(&id).is_some())
    }

    async fn revenue_by_payment_method(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PaymentMethodTotal>> {
        let state = self.state.lock().await;
        let mut totals: BTreeMap<String, i64> = BTreeMap::new();
        for order in state.orders.values() {
            if order.status == STATUS_COMPLETED
                && order.created_at >= start
                && order.created_at <= end
            {
                *totals.entry(order.payment_method.clone()).or_default() +=
                    order.total_amount.cents();
            }
        }
        Ok(totals
            .into_iter()
            .map(|(payment_method, cents)| PaymentMethodTotal {
                payment_method,
                total: common::Money::from_cents(cents),
            })
            .collect())
    }
}
