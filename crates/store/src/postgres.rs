//! PostgreSQL-backed storage implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId, ServiceId};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::model::{
    Customer, LineItem, NewCustomer, NewOrder, NewProduct, NewServiceOffering, Order,
    PaymentMethodTotal, Product, STATUS_COMPLETED, ServiceOffering,
};
use crate::repository::{
    CatalogStore, CustomerDirectory, OrderRepository, ServiceCatalog, StockDebit,
};
use crate::{Result, StoreError};

/// Transaction handle shared by the catalog store and order repository.
pub type PgTx = sqlx::Transaction<'static, sqlx::Postgres>;

/// Connects to PostgreSQL with a bounded connection pool.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(StoreError::Database)
}

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}

/// PostgreSQL-backed customer directory.
#[derive(Clone)]
pub struct PgCustomerDirectory {
    pool: PgPool,
}

impl PgCustomerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_customer(row: &PgRow) -> Result<Customer> {
    Ok(Customer {
        id: CustomerId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        address: row.try_get("address")?,
        tax_id: row.try_get("tax_id")?,
    })
}

#[async_trait]
impl CustomerDirectory for PgCustomerDirectory {
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, phone, email, address, tax_id FROM customers WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_customer).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query("SELECT id, name, phone, email, address, tax_id FROM customers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_customer).collect()
    }

    async fn insert(&self, customer: NewCustomer) -> Result<Customer> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO customers (name, phone, email, address, tax_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.tax_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Customer {
            id: CustomerId::new(id),
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            address: customer.address,
            tax_id: customer.tax_id,
        })
    }

    async fn update(&self, customer: Customer) -> Result<Option<Customer>> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = $2, phone = $3, email = $4, address = $5, tax_id = $6
            WHERE id = $1
            "#,
        )
        .bind(customer.id.as_i64())
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.tax_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(customer))
    }

    async fn delete_by_id(&self, id: CustomerId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL-backed product catalog.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        cost_price: row
            .try_get::<Option<i64>, _>("cost_price_cents")?
            .map(Money::from_cents),
        sale_price: row
            .try_get::<Option<i64>, _>("sale_price_cents")?
            .map(Money::from_cents),
        stock_quantity: row.try_get("stock_quantity")?,
    })
}

const PRODUCT_COLUMNS: &str = "id, name, description, cost_price_cents, sale_price_cents, stock_quantity";

#[async_trait]
impl CatalogStore for PgCatalogStore {
    type Tx = PgTx;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn insert(&self, product: NewProduct) -> Result<Product> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (name, description, cost_price_cents, sale_price_cents, stock_quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.cost_price.map(|m| m.cents()))
        .bind(product.sale_price.map(|m| m.cents()))
        .bind(product.stock_quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(Product {
            id: ProductId::new(id),
            name: product.name,
            description: product.description,
            cost_price: product.cost_price,
            sale_price: product.sale_price,
            stock_quantity: product.stock_quantity,
        })
    }

    async fn update(&self, product: Product) -> Result<Option<Product>> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, cost_price_cents = $4, sale_price_cents = $5, stock_quantity = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_i64())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.cost_price.map(|m| m.cents()))
        .bind(product.sale_price.map(|m| m.cents()))
        .bind(product.stock_quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(product))
    }

    async fn delete_by_id(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn debit_stock(
        &self,
        tx: &mut PgTx,
        id: ProductId,
        quantity: u32,
    ) -> Result<StockDebit> {
        // Single round-trip conditional decrement. Concurrent debits
        // serialize on the product row; the second transaction re-checks
        // the condition against the committed value.
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - $2
            WHERE id = $1 AND stock_quantity >= $2
            RETURNING stock_quantity
            "#,
        )
        .bind(id.as_i64())
        .bind(i64::from(quantity))
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(remaining) = remaining {
            tracing::debug!(product_id = %id, quantity, remaining, "stock debit staged");
            return Ok(StockDebit::Applied { remaining });
        }

        // Zero rows affected: distinguish a missing product from an
        // insufficient or untracked one, still inside the transaction.
        let available: Option<Option<i64>> =
            sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
                .bind(id.as_i64())
                .fetch_optional(&mut **tx)
                .await?;

        Ok(match available {
            None => StockDebit::ProductMissing,
            Some(available) => StockDebit::Insufficient { available },
        })
    }
}

/// PostgreSQL-backed catalog of offered services.
#[derive(Clone)]
pub struct PgServiceCatalog {
    pool: PgPool,
}

impl PgServiceCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_service(row: &PgRow) -> Result<ServiceOffering> {
    Ok(ServiceOffering {
        id: ServiceId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        base_price: row
            .try_get::<Option<i64>, _>("base_price_cents")?
            .map(Money::from_cents),
        category: row.try_get("category")?,
    })
}

const SERVICE_COLUMNS: &str = "id, name, description, base_price_cents, category";

#[async_trait]
impl ServiceCatalog for PgServiceCatalog {
    async fn find_by_id(&self, id: ServiceId) -> Result<Option<ServiceOffering>> {
        let row = sqlx::query(&format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_service).transpose()
    }

    async fn find_all(&self) -> Result<Vec<ServiceOffering>> {
        let rows = sqlx::query(&format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_service).collect()
    }

    async fn insert(&self, service: NewServiceOffering) -> Result<ServiceOffering> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO services (name, description, base_price_cents, category)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.base_price.map(|m| m.cents()))
        .bind(&service.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(ServiceOffering {
            id: ServiceId::new(id),
            name: service.name,
            description: service.description,
            base_price: service.base_price,
            category: service.category,
        })
    }

    async fn update(&self, service: ServiceOffering) -> Result<Option<ServiceOffering>> {
        let result = sqlx::query(
            r#"
            UPDATE services
            SET name = $2, description = $3, base_price_cents = $4, category = $5
            WHERE id = $1
            "#,
        )
        .bind(service.id.as_i64())
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.base_price.map(|m| m.cents()))
        .bind(&service.category)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(service))
    }

    async fn delete_by_id(&self, id: ServiceId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_line(row: &PgRow) -> Result<LineItem> {
    Ok(LineItem {
        id: row.try_get::<i64, _>("id")?.into(),
        order_id: row.try_get::<i64, _>("order_id")?.into(),
        product_id: row.try_get::<i64, _>("product_id")?.into(),
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
    })
}

fn row_to_order(row: &PgRow, lines: Vec<LineItem>) -> Result<Order> {
    Ok(Order {
        id: row.try_get::<i64, _>("id")?.into(),
        description: row.try_get("description")?,
        total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
        created_at: row.try_get("created_at")?,
        status: row.try_get("status")?,
        payment_method: row.try_get("payment_method")?,
        customer_id: row.try_get::<i64, _>("customer_id")?.into(),
        lines,
    })
}

const ORDER_COLUMNS: &str =
    "id, description, total_amount_cents, created_at, status, payment_method, customer_id";
const LINE_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price_cents";

#[async_trait]
impl OrderRepository for PgOrderRepository {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: PgTx) -> Result<()> {
        Ok(tx.commit().await?)
    }

    async fn insert(&self, tx: &mut PgTx, order: NewOrder) -> Result<Order> {
        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (description, total_amount_cents, created_at, status, payment_method, customer_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&order.description)
        .bind(order.total_amount.cents())
        .bind(order.created_at)
        .bind(&order.status)
        .bind(&order.payment_method)
        .bind(order.customer_id.as_i64())
        .fetch_one(&mut **tx)
        .await?;

        let mut lines = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                StoreError::OutOfRange(format!("line quantity {}", line.quantity))
            })?;
            let line_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO order_lines (order_id, product_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(order_id)
            .bind(line.product_id.as_i64())
            .bind(quantity)
            .bind(line.unit_price.cents())
            .fetch_one(&mut **tx)
            .await?;

            lines.push(LineItem {
                id: line_id.into(),
                order_id: order_id.into(),
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        Ok(Order {
            id: order_id.into(),
            description: order.description,
            total_amount: order.total_amount,
            created_at: order.created_at,
            status: order.status,
            payment_method: order.payment_method,
            customer_id: order.customer_id,
            lines,
        })
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let header = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let line_rows = sqlx::query(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = $1 ORDER BY id"
        ))
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let lines = line_rows.iter().map(row_to_line).collect::<Result<_>>()?;
        Ok(Some(row_to_order(&header, lines)?))
    }

    async fn find_all(&self) -> Result<Vec<Order>> {
        let headers = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        let line_rows = sqlx::query(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines ORDER BY order_id, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut lines_by_order: HashMap<i64, Vec<LineItem>> = HashMap::new();
        for row in &line_rows {
            let line = row_to_line(row)?;
            lines_by_order
                .entry(line.order_id.as_i64())
                .or_default()
                .push(line);
        }

        headers
            .iter()
            .map(|header| {
                let order_id: i64 = header.try_get("id")?;
                let lines = lines_by_order.remove(&order_id).unwrap_or_default();
                row_to_order(header, lines)
            })
            .collect()
    }

    async fn delete_by_id(&self, id: OrderId) -> Result<bool> {
        // Aggregate boundary: lines and header go in one transaction.
        // Stock debited at creation time is intentionally left as is.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM order_lines WHERE order_id = $1")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn revenue_by_payment_method(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PaymentMethodTotal>> {
        let rows = sqlx::query(
            r#"
            SELECT payment_method, COALESCE(SUM(total_amount_cents), 0)::BIGINT AS total
            FROM orders
            WHERE status = $1 AND created_at BETWEEN $2 AND $3
            GROUP BY payment_method
            ORDER BY payment_method
            "#,
        )
        .bind(STATUS_COMPLETED)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(PaymentMethodTotal {
                    payment_method: row.try_get("payment_method")?,
                    total: Money::from_cents(row.try_get("total")?),
                })
            })
            .collect()
    }
}
