//! Product CRUD endpoints. Stock quantities are set here by the back
//! office; the order endpoints are the only place stock is debited.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{CatalogStore, CustomerDirectory, NewProduct, OrderRepository, Product, ServiceCatalog};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub cost_price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub cost_price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        ProductResponse {
            id: product.id.as_i64(),
            name: product.name,
            description: product.description,
            cost_price_cents: product.cost_price.map(|m| m.cents()),
            sale_price_cents: product.sale_price.map(|m| m.cents()),
            stock_quantity: product.stock_quantity,
        }
    }
}

/// GET /products
pub async fn list<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let products = state.catalog.find_all().await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/:id
pub async fn get<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let product = state
        .catalog
        .find_by_id(ProductId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;
    Ok(Json(product.into()))
}

/// POST /products
pub async fn create<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Json(req): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let product = state
        .catalog
        .insert(NewProduct {
            name: req.name,
            description: req.description,
            cost_price: req.cost_price_cents.map(Money::from_cents),
            sale_price: req.sale_price_cents.map(Money::from_cents),
            stock_quantity: req.stock_quantity,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /products/:id — replace a product's fields, stock included.
pub async fn update<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Path(id): Path<i64>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<ProductResponse>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let product = state
        .catalog
        .update(Product {
            id: ProductId::new(id),
            name: req.name,
            description: req.description,
            cost_price: req.cost_price_cents.map(Money::from_cents),
            sale_price: req.sale_price_cents.map(Money::from_cents),
            stock_quantity: req.stock_quantity,
        })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;
    Ok(Json(product.into()))
}

/// DELETE /products/:id
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
    state.catalog.delete_by_id(ProductId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
