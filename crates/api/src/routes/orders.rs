//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CustomerId, Money, OrderId, ProductId};
use domain::{CreateOrder, LineRequest, OrderService};
use serde::{Deserialize, Serialize};
use store::{CatalogStore, CustomerDirectory, Order, OrderRepository, ServiceCatalog};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
///
/// The catalogs and the customer directory are held alongside the order
/// service so the plain CRUD endpoints can reach them directly.
pub struct AppState<C, D, R, S> {
    pub orders: OrderService<C, D, R>,
    pub catalog: C,
    pub customers: D,
    pub services: S,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub description: Option<String>,
    pub total_amount_cents: i64,
    pub status: String,
    pub payment_method: String,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub product_id: i64,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub customer_id: i64,
    pub description: Option<String>,
    pub total_amount_cents: i64,
    pub created_at: String,
    pub status: String,
    pub payment_method: String,
    pub items: Vec<LineItemResponse>,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id.as_i64(),
            customer_id: order.customer_id.as_i64(),
            description: order.description,
            total_amount_cents: order.total_amount.cents(),
            created_at: order.created_at.to_rfc3339(),
            status: order.status,
            payment_method: order.payment_method,
            items: order
                .lines
                .into_iter()
                .map(|line| LineItemResponse {
                    id: line.id.as_i64(),
                    product_id: line.product_id.as_i64(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /orders — create a sales order, debiting stock per line.
#[tracing::instrument(skip(state, req))]
pub async fn create<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let order = state
        .orders
        .create_order(CreateOrder {
            customer_id: CustomerId::new(req.customer_id),
            description: req.description,
            total_amount: Money::from_cents(req.total_amount_cents),
            status: req.status,
            payment_method: req.payment_method,
            lines: req
                .items
                .into_iter()
                .map(|item| LineRequest {
                    product_id: ProductId::new(item.product_id),
                    quantity: item.quantity,
                    unit_price: Money::from_cents(item.unit_price_cents),
                })
                .collect(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/:id — load an order with its line items.
#[tracing::instrument(skip(state))]
pub async fn get<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let order = state
        .orders
        .get_order(OrderId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order.into()))
}

/// GET /orders — list every order with its line items.
#[tracing::instrument(skip(state))]
pub async fn list<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let orders = state.orders.list_orders().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// DELETE /orders/:id — remove the order and its line items.
///
/// Absent orders are treated as already deleted; stock debited at
/// creation time is not restored.
#[tracing::instrument(skip(state))]
pub async fn delete<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    state.orders.delete_order(OrderId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
