//! Integration tests for the order service.
//!
//! These exercise the order-creation transaction end to end against the
//! in-memory store: stock debit correctness, rollback on mid-request
//! failure, oversell protection under concurrency, and the aggregate
//! delete semantics.

use chrono::Utc;
use common::{CustomerId, Money, OrderId, ProductId};
use domain::{CreateOrder, LineRequest, OrderError, OrderService};
use store::{
    CatalogStore, Customer, CustomerDirectory, MemoryStore, NewCustomer, NewProduct,
    OrderRepository, Product, STATUS_COMPLETED, StoreError,
};

type MemoryService = OrderService<MemoryStore, MemoryStore, MemoryStore>;

fn service(store: &MemoryStore) -> MemoryService {
    OrderService::new(store.clone(), store.clone(), store.clone())
}

async fn seed_customer(store: &MemoryStore) -> Customer {
    CustomerDirectory::insert(
        store,
        NewCustomer {
            name: "Maria Souza".to_string(),
            phone: Some("11 99999-0000".to_string()),
            email: None,
            address: None,
            tax_id: None,
        },
    )
    .await
    .unwrap()
}

async fn seed_product(store: &MemoryStore, name: &str, stock: Option<i64>) -> Product {
    CatalogStore::insert(
        store,
        NewProduct {
            name: name.to_string(),
            description: None,
            cost_price: Some(Money::from_cents(600)),
            sale_price: Some(Money::from_cents(1500)),
            stock_quantity: stock,
        },
    )
    .await
    .unwrap()
}

fn request(customer_id: CustomerId, lines: Vec<(ProductId, u32, i64)>) -> CreateOrder {
    let total: i64 = lines
        .iter()
        .map(|(_, qty, price)| i64::from(*qty) * price)
        .sum();
    CreateOrder {
        customer_id,
        description: Some("counter sale".to_string()),
        total_amount: Money::from_cents(total),
        status: STATUS_COMPLETED.to_string(),
        payment_method: "PIX".to_string(),
        lines: lines
            .into_iter()
            .map(|(product_id, quantity, price)| LineRequest {
                product_id,
                quantity,
                unit_price: Money::from_cents(price),
            })
            .collect(),
    }
}

async fn stock_of(store: &MemoryStore, id: ProductId) -> Option<i64> {
    CatalogStore::find_by_id(store, id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

mod create_order {
    use super::*;

    #[tokio::test]
    async fn debits_stock_and_assigns_ids() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "Widget", Some(5)).await;

        let before = Utc::now();
        let order = svc
            .create_order(request(customer.id, vec![(product.id, 3, 1000)]))
            .await
            .unwrap();
        let after = Utc::now();

        assert_eq!(order.customer_id, customer.id);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, 3);
        assert_eq!(order.lines[0].order_id, order.id);
        assert!(order.created_at >= before && order.created_at <= after);

        assert_eq!(stock_of(&store, product.id).await, Some(2));

        let persisted = svc.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(persisted, order);
    }

    #[tokio::test]
    async fn debits_each_product_once_per_line() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let a = seed_product(&store, "A", Some(10)).await;
        let b = seed_product(&store, "B", Some(4)).await;

        svc.create_order(request(
            customer.id,
            vec![(a.id, 2, 1000), (b.id, 4, 500), (a.id, 3, 1000)],
        ))
        .await
        .unwrap();

        // Same product referenced twice in one order: debits sum.
        assert_eq!(stock_of(&store, a.id).await, Some(5));
        assert_eq!(stock_of(&store, b.id).await, Some(0));
    }

    #[tokio::test]
    async fn uses_caller_supplied_unit_price_not_sale_price() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        // Catalog sale price is 1500; caller negotiated 1200.
        let product = seed_product(&store, "Widget", Some(5)).await;

        let order = svc
            .create_order(request(customer.id, vec![(product.id, 1, 1200)]))
            .await
            .unwrap();

        assert_eq!(order.lines[0].unit_price, Money::from_cents(1200));
    }

    #[tokio::test]
    async fn declared_total_is_persisted_unvalidated() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "Widget", Some(5)).await;

        let mut req = request(customer.id, vec![(product.id, 2, 1000)]);
        req.total_amount = Money::from_cents(1); // does not match 2 x 1000

        let order = svc.create_order(req).await.unwrap();
        assert_eq!(order.total_amount, Money::from_cents(1));
    }

    #[tokio::test]
    async fn sequential_requests_exhaust_stock() {
        // Scenario: stock 5; first request for 3 succeeds leaving 2, the
        // next request for 3 fails short by 1 and leaves stock untouched.
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "P1", Some(5)).await;

        let order = svc
            .create_order(request(customer.id, vec![(product.id, 3, 1000)]))
            .await
            .unwrap();
        assert_eq!(order.lines[0].quantity, 3);
        assert_eq!(stock_of(&store, product.id).await, Some(2));

        let err = svc
            .create_order(request(customer.id, vec![(product.id, 3, 1000)]))
            .await
            .unwrap_err();
        match err {
            OrderError::InsufficientStock {
                product_id,
                requested,
                available,
            } => {
                assert_eq!(product_id, product.id);
                assert_eq!(requested, 3);
                assert_eq!(available, Some(2));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(err.shortfall(), Some(1));

        assert_eq!(stock_of(&store, product.id).await, Some(2));
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn untracked_stock_cannot_be_sold() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "Untracked", None).await;

        let err = svc
            .create_order(request(customer.id, vec![(product.id, 1, 1000)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InsufficientStock {
                available: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn rejects_empty_and_zero_quantity_requests() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "Widget", Some(5)).await;

        let err = svc
            .create_order(request(customer.id, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::EmptyOrder));

        let err = svc
            .create_order(request(customer.id, vec![(product.id, 0, 1000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidQuantity { product_id } if product_id == product.id));

        assert_eq!(stock_of(&store, product.id).await, Some(5));
    }

    #[tokio::test]
    async fn rejects_quantities_beyond_storage_range() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "Bulk", Some(i64::MAX)).await;

        // One above the largest storable line quantity.
        let over = domain::MAX_LINE_QUANTITY + 1;
        let err = svc
            .create_order(request(customer.id, vec![(product.id, over, 1000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidQuantity { product_id } if product_id == product.id));

        assert_eq!(stock_of(&store, product.id).await, Some(i64::MAX));
        assert_eq!(store.order_count().await, 0);

        // The bound itself is accepted.
        let order = svc
            .create_order(request(customer.id, vec![(product.id, domain::MAX_LINE_QUANTITY, 1)]))
            .await
            .unwrap();
        assert_eq!(order.lines[0].quantity, domain::MAX_LINE_QUANTITY);
    }
}

mod rollback {
    use super::*;

    #[tokio::test]
    async fn missing_product_rolls_back_earlier_debits() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let a = seed_product(&store, "A", Some(10)).await;

        let err = svc
            .create_order(request(
                customer.id,
                vec![(a.id, 4, 1000), (ProductId::new(999), 1, 500)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::ProductNotFound { product_id } if product_id == ProductId::new(999)));

        // The debit of product A within the same request is rolled back.
        assert_eq!(stock_of(&store, a.id).await, Some(10));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn insufficient_later_line_rolls_back_earlier_debits() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let a = seed_product(&store, "A", Some(10)).await;
        let b = seed_product(&store, "B", Some(1)).await;

        let err = svc
            .create_order(request(customer.id, vec![(a.id, 4, 1000), (b.id, 2, 500)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { .. }));

        assert_eq!(stock_of(&store, a.id).await, Some(10));
        assert_eq!(stock_of(&store, b.id).await, Some(1));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_customer_leaves_stock_untouched() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let product = seed_product(&store, "Widget", Some(5)).await;

        let err = svc
            .create_order(request(CustomerId::new(42), vec![(product.id, 2, 1000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::CustomerNotFound { customer_id } if customer_id == CustomerId::new(42)));

        assert_eq!(stock_of(&store, product.id).await, Some(5));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn commit_failure_rolls_back_debits_and_order() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "Widget", Some(5)).await;

        store.set_fail_next_commit(true);
        let err = svc
            .create_order(request(customer.id, vec![(product.id, 3, 1000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Store(StoreError::Unavailable(_))));
        assert!(!err.is_client_error());

        assert_eq!(stock_of(&store, product.id).await, Some(5));
        assert_eq!(store.order_count().await, 0);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_requests_cannot_oversell() {
        let store = MemoryStore::new();
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "Scarce", Some(5)).await;

        // Two concurrent requests, each individually satisfiable, jointly
        // exceeding stock. Exactly one may commit.
        let svc_a = service(&store);
        let svc_b = service(&store);
        let req_a = request(customer.id, vec![(product.id, 3, 1000)]);
        let req_b = request(customer.id, vec![(product.id, 3, 1000)]);

        let (res_a, res_b) = tokio::join!(
            tokio::spawn(async move { svc_a.create_order(req_a).await }),
            tokio::spawn(async move { svc_b.create_order(req_b).await }),
        );
        let results = [res_a.unwrap(), res_b.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(OrderError::InsufficientStock {
                requested: 3,
                available: Some(2),
                ..
            })
        )));

        assert_eq!(stock_of(&store, product.id).await, Some(2));
        assert_eq!(store.order_count().await, 1);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn get_missing_order_is_absent_not_an_error() {
        let store = MemoryStore::new();
        let svc = service(&store);

        assert!(svc.get_order(OrderId::new(123)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_returns_every_order_with_lines() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "Widget", Some(10)).await;

        svc.create_order(request(customer.id, vec![(product.id, 1, 1000)]))
            .await
            .unwrap();
        svc.create_order(request(customer.id, vec![(product.id, 2, 1000)]))
            .await
            .unwrap();

        let orders = svc.list_orders().await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| !o.lines.is_empty()));
    }

    #[tokio::test]
    async fn delete_removes_aggregate_but_not_stock_debit() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "Widget", Some(5)).await;

        let order = svc
            .create_order(request(customer.id, vec![(product.id, 3, 1000)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&store, product.id).await, Some(2));

        assert!(svc.delete_order(order.id).await.unwrap());
        assert!(svc.get_order(order.id).await.unwrap().is_none());

        // Deleting the order does not restore the debited stock.
        assert_eq!(stock_of(&store, product.id).await, Some(2));

        // Deleting again reports that nothing existed.
        assert!(!svc.delete_order(order.id).await.unwrap());
    }
}

mod revenue {
    use super::*;

    #[tokio::test]
    async fn report_covers_committed_sales_only() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "Widget", Some(100)).await;

        let start = Utc::now();

        let mut cash = request(customer.id, vec![(product.id, 1, 2000)]);
        cash.payment_method = "dinheiro".to_string();
        svc.create_order(cash).await.unwrap();

        let mut pix = request(customer.id, vec![(product.id, 1, 1000)]);
        pix.payment_method = "PIX".to_string();
        svc.create_order(pix).await.unwrap();

        let mut open = request(customer.id, vec![(product.id, 1, 9000)]);
        open.status = "ABERTA".to_string();
        svc.create_order(open).await.unwrap();

        let end = Utc::now();
        let report = svc.revenue_report(start, end).await.unwrap();

        assert_eq!(report.cash_total.cents(), 2000);
        assert_eq!(report.pix_total.cents(), 1000);
        assert_eq!(report.cash_and_pix_total.cents(), 3000);
        // The open order is excluded entirely.
        assert_eq!(report.by_payment_method.len(), 2);
    }

    #[tokio::test]
    async fn report_window_excludes_orders_outside_range() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let customer = seed_customer(&store).await;
        let product = seed_product(&store, "Widget", Some(100)).await;

        svc.create_order(request(customer.id, vec![(product.id, 1, 1000)]))
            .await
            .unwrap();

        let start = Utc::now() + chrono::Duration::hours(1);
        let end = start + chrono::Duration::hours(1);
        let report = svc.revenue_report(start, end).await.unwrap();
        assert!(report.by_payment_method.is_empty());
    }
}
