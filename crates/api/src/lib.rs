//! HTTP API server for the point-of-sale backend.
//!
//! Exposes order creation and lifecycle endpoints, customer, product and
//! service CRUD, the revenue report, and health/metrics, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use domain::OrderService;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use store::{
    CatalogStore, CustomerDirectory, MemoryStore, OrderRepository, PgCatalogStore,
    PgCustomerDirectory, PgOrderRepository, PgServiceCatalog, ServiceCatalog,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<C, D, R, S>(
    state: Arc<AppState<C, D, R, S>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            get(routes::orders::list::<C, D, R, S>).post(routes::orders::create::<C, D, R, S>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<C, D, R, S>).delete(routes::orders::delete::<C, D, R, S>),
        )
        .route(
            "/customers",
            get(routes::customers::list::<C, D, R, S>).post(routes::customers::create::<C, D, R, S>),
        )
        .route(
            "/customers/{id}",
            get(routes::customers::get::<C, D, R, S>)
                .put(routes::customers::update::<C, D, R, S>)
                .delete(routes::customers::delete::<C, D, R, S>),
        )
        .route(
            "/products",
            get(routes::products::list::<C, D, R, S>).post(routes::products::create::<C, D, R, S>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<C, D, R, S>)
                .put(routes::products::update::<C, D, R, S>)
                .delete(routes::products::delete::<C, D, R, S>),
        )
        .route(
            "/services",
            get(routes::services::list::<C, D, R, S>).post(routes::services::create::<C, D, R, S>),
        )
        .route(
            "/services/{id}",
            get(routes::services::get::<C, D, R, S>)
                .put(routes::services::update::<C, D, R, S>)
                .delete(routes::services::delete::<C, D, R, S>),
        )
        .route("/reports/revenue", get(routes::reports::revenue::<C, D, R, S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over PostgreSQL-backed storage.
pub fn create_pg_state(
    pool: PgPool,
) -> Arc<AppState<PgCatalogStore, PgCustomerDirectory, PgOrderRepository, PgServiceCatalog>> {
    let catalog = PgCatalogStore::new(pool.clone());
    let customers = PgCustomerDirectory::new(pool.clone());
    let services = PgServiceCatalog::new(pool.clone());
    let orders = PgOrderRepository::new(pool);

    Arc::new(AppState {
        orders: OrderService::new(catalog.clone(), customers.clone(), orders),
        catalog,
        customers,
        services,
    })
}

/// Creates the application state over the in-memory store, for tests.
pub fn create_memory_state(
    store: MemoryStore,
) -> Arc<AppState<MemoryStore, MemoryStore, MemoryStore, MemoryStore>> {
    Arc::new(AppState {
        orders: OrderService::new(store.clone(), store.clone(), store.clone()),
        catalog: store.clone(),
        customers: store.clone(),
        services: store,
    })
}
