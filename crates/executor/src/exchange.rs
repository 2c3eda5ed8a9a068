use crate::error::ExecutorError;
use api_client::ApiClient;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use core_types::{Execution, OrderRequest};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// A generic trait for an execution engine.
///
/// This trait allows the engine to be agnostic about whether it is talking to
/// a simulated exchange or a real one.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Submits a market order and returns the fill receipt.
    ///
    /// `reference_price` is the last price the caller saw. Live executors only
    /// use it for logging; the simulated executor fills at it.
    async fn execute(
        &self,
        order: &OrderRequest,
        reference_price: Decimal,
    ) -> Result<Execution, ExecutorError>;
}

/// Paper-trading executor: every order fills in full at the reference price.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedExecutor;

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for SimulatedExecutor {
    async fn execute(
        &self,
        order: &OrderRequest,
        reference_price: Decimal,
    ) -> Result<Execution, ExecutorError> {
        if reference_price <= Decimal::ZERO {
            return Err(ExecutorError::InvalidOrder(format!(
                "cannot simulate a fill at price {reference_price}"
            )));
        }

        let execution = Execution {
            order_id: format!("paper-{}", Uuid::new_v4().simple()),
            client_order_id: order.client_order_id,
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            avg_price: Some(reference_price),
            status: "FILLED".to_string(),
            timestamp: Utc::now(),
        };
        tracing::debug!(?execution, "SimulatedExecutor: filled order.");
        Ok(execution)
    }
}

/// The "live" executor that sends real orders to the exchange via the ApiClient.
pub struct LiveExecutor {
    api_client: Arc<dyn ApiClient>,
    timeout: Duration,
}

impl LiveExecutor {
    pub fn new(api_client: Arc<dyn ApiClient>, timeout: Duration) -> Self {
        Self {
            api_client,
            timeout,
        }
    }
}

#[async_trait]
impl Executor for LiveExecutor {
    /// Places the order, bounded by the configured timeout, and transforms the
    /// exchange's response into our internal `Execution` format.
    async fn execute(
        &self,
        order: &OrderRequest,
        reference_price: Decimal,
    ) -> Result<Execution, ExecutorError> {
        tracing::debug!(
            symbol = %order.symbol,
            side = ?order.side,
            quantity = %order.quantity,
            %reference_price,
            "LiveExecutor: placing market order."
        );

        let response = tokio::time::timeout(self.timeout, self.api_client.place_market_order(order))
            .await
            .map_err(|_| ExecutorError::Timeout(self.timeout))??;

        if response.is_cancelled() {
            if response.executed_qty.is_zero() {
                return Err(ExecutorError::Cancelled {
                    order_id: response.order_id.to_string(),
                    status: response.status,
                });
            }
            // What did execute is held on the exchange and must be tracked.
            tracing::warn!(
                symbol = %order.symbol,
                status = %response.status,
                requested = %order.quantity,
                executed = %response.executed_qty,
                "LiveExecutor: order ended early after a partial fill."
            );
        }

        let execution = Execution {
            order_id: response.order_id.to_string(),
            client_order_id: order.client_order_id,
            symbol: response.symbol.clone(),
            side: order.side,
            quantity: if response.executed_qty.is_zero() {
                order.quantity
            } else {
                response.executed_qty
            },
            avg_price: response.average_price(),
            status: response.status.clone(),
            timestamp: Utc
                .timestamp_millis_opt(response.transact_time)
                .single()
                .unwrap_or_else(Utc::now),
        };

        tracing::debug!(?execution, "LiveExecutor: order accepted.");
        Ok(execution)
    }
}
