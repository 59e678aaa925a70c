//! Offered-service CRUD endpoints. Services are quoting data for the
//! front office and never touch stock.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Money, ServiceId};
use serde::{Deserialize, Serialize};
use store::{
    CatalogStore, CustomerDirectory, NewServiceOffering, OrderRepository, ServiceCatalog,
    ServiceOffering,
};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct ServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub base_price_cents: Option<i64>,
    pub category: Option<String>,
}

#[derive(Serialize)]
pub struct ServiceResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub base_price_cents: Option<i64>,
    pub category: Option<String>,
}

impl From<ServiceOffering> for ServiceResponse {
    fn from(service: ServiceOffering) -> Self {
        ServiceResponse {
            id: service.id.as_i64(),
            name: service.name,
            description: service.description,
            base_price_cents: service.base_price.map(|m| m.cents()),
            category: service.category,
        }
    }
}

/// GET /services
pub async fn list<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
) -> Result<Json<Vec<ServiceResponse>>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let services = state.services.find_all().await?;
    Ok(Json(services.into_iter().map(Into::into).collect()))
}

/// GET /services/:id
pub async fn get<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ServiceResponse>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let service = state
        .services
        .find_by_id(ServiceId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("service {id} not found")))?;
    Ok(Json(service.into()))
}

/// POST /services
pub async fn create<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Json(req): Json<ServiceRequest>,
) -> Result<(StatusCode, Json<ServiceResponse>), ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let service = state
        .services
        .insert(NewServiceOffering {
            name: req.name,
            description: req.description,
            base_price: req.base_price_cents.map(Money::from_cents),
            category: req.category,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(service.into())))
}

/// PUT /services/:id — replace a service's fields.
pub async fn update<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Path(id): Path<i64>,
    Json(req): Json<ServiceRequest>,
) -> Result<Json<ServiceResponse>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    let service = state
        .services
        .update(ServiceOffering {
            id: ServiceId::new(id),
            name: req.name,
            description: req.description,
            base_price: req.base_price_cents.map(Money::from_cents),
            category: req.category,
        })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("service {id} not found")))?;
    Ok(Json(service.into()))
}

/// DELETE /services/:id
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
    state.services.delete_by_id(ServiceId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
