use api_client::error::ApiError;
use std::time::Duration;
use thiserror::Error;

/// Every variant means the order did not go through and no position changed.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Order {order_id} ended with status {status}")]
    Cancelled { order_id: String, status: String },

    #[error("Order call did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Order cannot be executed: {0}")]
    InvalidOrder(String),
}
