//! Domain layer for the point-of-sale backend.
//!
//! The one component with real invariants lives here: [`OrderService`]
//! turns a requested sale into a persisted order while guaranteeing that
//! no line is sold beyond available stock and that stock is debited
//! exactly once per committed order.

pub mod error;
pub mod report;
pub mod request;
pub mod service;

pub use error::OrderError;
pub use report::{CASH_PAYMENT_METHOD, PIX_PAYMENT_METHOD, RevenueReport};
pub use request::{CreateOrder, LineRequest, MAX_LINE_QUANTITY};
pub use service::OrderService;
