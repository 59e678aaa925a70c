//! Storage collaborator traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId, ServiceId};

use crate::Result;
use crate::model::{
    Customer, NewCustomer, NewOrder, NewProduct, NewServiceOffering, Order, PaymentMethodTotal,
    Product, ServiceOffering,
};

/// Outcome of a conditional stock debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDebit {
    /// The debit was applied; `remaining` is the stock left afterwards.
    Applied { remaining: i64 },

    /// The debit was rejected: known stock is below the requested quantity,
    /// or stock is not tracked for this product (`available` is `None`).
    Insufficient { available: Option<i64> },

    /// No product exists with the given id.
    ProductMissing,
}

/// Read/write access to the customer directory.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>>;

    async fn find_all(&self) -> Result<Vec<Customer>>;

    /// Persists a new customer and returns it with its assigned id.
    async fn insert(&self, customer: NewCustomer) -> Result<Customer>;

    /// Updates a customer in place. Returns None if no such customer
    /// exists.
    async fn update(&self, customer: Customer) -> Result<Option<Customer>>;

    /// Deletes a customer. Returns false if no such customer existed.
    async fn delete_by_id(&self, id: CustomerId) -> Result<bool>;
}

/// Read/write access to the offered-services catalog.
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn find_by_id(&self, id: ServiceId) -> Result<Option<ServiceOffering>>;

    async fn find_all(&self) -> Result<Vec<ServiceOffering>>;

    /// Persists a new service and returns it with its assigned id.
    async fn insert(&self, service: NewServiceOffering) -> Result<ServiceOffering>;

    /// Updates a service in place. Returns None if no such service exists.
    async fn update(&self, service: ServiceOffering) -> Result<Option<ServiceOffering>>;

    /// Deletes a service. Returns false if no such service existed.
    async fn delete_by_id(&self, id: ServiceId) -> Result<bool>;
}

/// Read/write access to the product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Transaction handle type. Must match the order repository's so that
    /// stock debits join the order-creation transaction.
    type Tx: Send;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>>;

    async fn find_all(&self) -> Result<Vec<Product>>;

    /// Persists a new product and returns it with its assigned id.
    async fn insert(&self, product: NewProduct) -> Result<Product>;

    /// Updates a product in place. Returns None if no such product exists.
    async fn update(&self, product: Product) -> Result<Option<Product>>;

    /// Deletes a product. Returns false if no such product existed.
    async fn delete_by_id(&self, id: ProductId) -> Result<bool>;

    /// Conditionally debits stock inside the supplied transaction:
    /// subtract `quantity` where `stock_quantity >= quantity`, in a single
    /// round trip. The debit only becomes visible when the transaction
    /// commits; dropping the transaction discards it.
    ///
    /// Concurrent debits against the same product serialize on the product
    /// row, so two overlapping orders can never both observe the same
    /// stock as available.
    async fn debit_stock(
        &self,
        tx: &mut Self::Tx,
        id: ProductId,
        quantity: u32,
    ) -> Result<StockDebit>;
}

/// Persistence for the order aggregate.
///
/// The aggregate (header plus owned line items) is written and deleted as
/// one unit; no operation exposes a partially constructed order.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Transaction handle type shared with [`CatalogStore`].
    type Tx: Send;

    /// Opens the transaction that scopes order creation. Dropping the
    /// handle without [`commit`](Self::commit) rolls back every mutation
    /// staged within it, stock debits included.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Commits the transaction.
    async fn commit(&self, tx: Self::Tx) -> Result<()>;

    /// Inserts the aggregate within the transaction, assigning the order
    /// id and every line-item id.
    async fn insert(&self, tx: &mut Self::Tx, order: NewOrder) -> Result<Order>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    async fn find_all(&self) -> Result<Vec<Order>>;

    /// Deletes the order and all of its line items in one transaction.
    /// Returns false if no such order existed. Does not touch stock.
    async fn delete_by_id(&self, id: OrderId) -> Result<bool>;

    /// Sums the declared totals of committed sales (status
    /// [`STATUS_COMPLETED`](crate::STATUS_COMPLETED)) created within
    /// `[start, end]`, grouped by payment method.
    async fn revenue_by_payment_method(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PaymentMethodTotal>>;
}
