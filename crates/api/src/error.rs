//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Every response body carries a machine-readable `code` next to the
/// human-readable message, so callers can tell "retry with different
/// input" failures from "retry later" ones.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order operation failure.
    Order(OrderError),
    /// Storage failure outside an order operation.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Order(err) => order_error_to_response(err),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_failure",
                    err.to_string(),
                )
            }
        };

        let body = serde_json::json!({ "code": code, "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, &'static str, String) {
    let (status, code) = match &err {
        OrderError::EmptyOrder => (StatusCode::BAD_REQUEST, "empty_order"),
        OrderError::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, "invalid_quantity"),
        OrderError::CustomerNotFound { .. } => (StatusCode::NOT_FOUND, "customer_not_found"),
        OrderError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, "product_not_found"),
        OrderError::InsufficientStock { .. } => (StatusCode::CONFLICT, "insufficient_stock"),
        OrderError::Store(store_err) => {
            tracing::error!(error = %store_err, "order persistence failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "storage_failure")
        }
    };
    (status, code, err.to_string())
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
