//! Customer CRUD endpoints. Plain single-table operations with no
//! coordination logic.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CustomerId;
use serde::Deserialize;
use store::{
    CatalogStore, Customer, CustomerDirectory, NewCustomer, OrderRepository, ServiceCatalog,
};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

/// GET /customers
pub async fn list<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
) -> Result<Json<Vec<Customer>>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    Ok(Json(state.customers.find_all().await?))
}

/// GET /customers/:id
pub async fn get<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let customer = state
        .customers
        .find_by_id(CustomerId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("customer {id} not found")))?;
    Ok(Json(customer))
}

/// POST /customers
pub async fn create<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let customer = state
        .customers
        .insert(NewCustomer {
            name: req.name,
            phone: req.phone,
            email: req.email,
            address: req.address,
            tax_id: req.tax_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// PUT /customers/:id — replace a customer's contact fields.
pub async fn update<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Path(id): Path<i64>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<Json<Customer>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let customer = state
        .customers
        .update(Customer {
            id: CustomerId::new(id),
            name: req.name,
            phone: req.phone,
            email: req.email,
            address: req.address,
            tax_id: req.tax_id,
        })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("customer {id} not found")))?;
    Ok(Json(customer))
}

/// DELETE /customers/:id
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
    state.customers.delete_by_id(CustomerId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
