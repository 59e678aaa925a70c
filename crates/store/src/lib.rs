//! Persistence layer for the point-of-sale backend.
//!
//! Defines the entity types and the storage collaborators the order
//! service and API are built on:
//!
//! - [`CustomerDirectory`] — read/write access to customers
//! - [`CatalogStore`] — read/write access to products, including the
//!   conditional stock debit used during order creation
//! - [`ServiceCatalog`] — read/write access to offered services
//! - [`OrderRepository`] — the order aggregate (header plus owned line
//!   items), persisted and deleted as one transactional unit
//!
//! Two implementations are provided: PostgreSQL (production) and an
//! in-memory store for tests.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use model::{
    Customer, LineItem, NewCustomer, NewLineItem, NewOrder, NewProduct, NewServiceOffering, Order,
    PaymentMethodTotal, Product, STATUS_COMPLETED, ServiceOffering,
};
pub use postgres::{
    PgCatalogStore, PgCustomerDirectory, PgOrderRepository, PgServiceCatalog, PgTx, connect,
    run_migrations,
};
pub use repository::{
    CatalogStore, CustomerDirectory, OrderRepository, ServiceCatalog, StockDebit,
};
