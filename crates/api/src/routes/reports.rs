//! Revenue report endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use domain::RevenueReport;
use serde::{Deserialize, Serialize};
use store::{CatalogStore, CustomerDirectory, OrderRepository, ServiceCatalog};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    /// Window start, RFC 3339.
    pub start: DateTime<Utc>,
    /// Window end, RFC 3339.
    pub end: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct RevenueResponse {
    pub by_payment_method: Vec<PaymentMethodTotalResponse>,
    pub cash_total_cents: i64,
    pub pix_total_cents: i64,
    pub cash_and_pix_total_cents: i64,
}

#[derive(Serialize)]
pub struct PaymentMethodTotalResponse {
    pub payment_method: String,
    pub total_cents: i64,
}

impl From<RevenueReport> for RevenueResponse {
    fn from(report: RevenueReport) -> Self {
        RevenueResponse {
            by_payment_method: report
                .by_payment_method
                .into_iter()
                .map(|row| PaymentMethodTotalResponse {
                    payment_method: row.payment_method,
                    total_cents: row.total.cents(),
                })
                .collect(),
            cash_total_cents: report.cash_total.cents(),
            pix_total_cents: report.pix_total.cents(),
            cash_and_pix_total_cents: report.cash_and_pix_total.cents(),
        }
    }
}

/// GET /reports/revenue?start=..&end=.. — committed-sale revenue grouped
/// by payment method.
#[tracing::instrument(skip(state))]
pub async fn revenue<C, D, R, S>(
    State(state): State<Arc<AppState<C, D, R, S>>>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<RevenueResponse>, ApiError>
where
    C: CatalogStore + 'static,
    D: CustomerDirectory + 'static,
    R: OrderRepository<Tx = C::Tx> + 'static,
    S: ServiceCatalog + 'static,
{
    if query.end < query.start {
        return Err(ApiError::BadRequest(
            "end must not precede start".to_string(),
        ));
    }
    let report = state.orders.revenue_report(query.start, query.end).await?;
    Ok(Json(report.into()))
}
