use crate::auth::sign_request;
use crate::error::ApiError;
use crate::responses::RawKline;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use configuration::ExchangeConfig;
use core_types::{Kline, OrderRequest, OrderSide};
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

mod auth;
pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::{ApiErrorResponse, Fill, OrderResponse, Ticker};

/// The generic, abstract interface for a trading exchange API client.
/// This trait is the contract that the engine uses, allowing the
/// underlying implementation (live or mock) to be swapped out.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Fetches the latest traded price of a symbol.
    async fn get_ticker(&self, symbol: &str) -> Result<Ticker, ApiError>;

    /// Fetches the most recent `limit` klines, oldest first.
    async fn get_klines(&self, symbol: &str, interval: &str, limit: u16)
    -> Result<Vec<Kline>, ApiError>;

    /// Places a market order. (Authenticated)
    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderResponse, ApiError>;
}

/// A concrete implementation of the `ApiClient` for the Binance spot REST API.
#[derive(Clone)]
pub struct BinanceSpotClient {
    client: reqwest::Client,
    base_url: String,
    api_secret: String,
}

impl BinanceSpotClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let key = HeaderValue::from_str(&config.api_key)
                .map_err(|e| ApiError::Configuration(format!("invalid API key: {e}")))?;
            headers.insert("X-MBX-APIKEY", key);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_secret: config.api_secret.clone(),
        })
    }

    async fn post_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &mut BTreeMap<&str, String>,
    ) -> Result<T, ApiError> {
        if self.api_secret.is_empty() {
            return Err(ApiError::Configuration(
                "an API secret is required for signed requests".to_string(),
            ));
        }
        params.insert("timestamp", Utc::now().timestamp_millis().to_string());

        let query_string =
            serde_qs::to_string(params).map_err(|e| ApiError::InvalidData(e.to_string()))?;
        let signature = sign_request(&self.api_secret, &query_string)?;
        let url = format!(
            "{}{}?{}&signature={}",
            self.base_url, path, query_string, signature
        );

        let response = self.client.post(&url).send().await?;
        Self::read_body(response).await
    }

    /// Decodes a success body into `T`, or an error body into `ApiError::Exchange`.
    async fn read_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            let api_error: ApiErrorResponse = serde_json::from_str(&text).map_err(|e| {
                ApiError::Deserialization(format!(
                    "Failed to deserialize error response ({status}): {e}. Original text: {text}"
                ))
            })?;
            Err(ApiError::Exchange {
                code: api_error.code,
                msg: api_error.msg,
            })
        }
    }
}

fn side_param(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "BUY",
        OrderSide::Sell => "SELL",
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(raw).map_err(|e| ApiError::Deserialization(format!("{field} '{raw}': {e}")))
}

fn into_kline(raw: RawKline) -> Result<Kline, ApiError> {
    Ok(Kline {
        open_time: Utc
            .timestamp_millis_opt(raw.0)
            .single()
            .ok_or_else(|| ApiError::InvalidData(format!("Invalid open_time: {}", raw.0)))?,
        open: parse_decimal("open", &raw.1)?,
        high: parse_decimal("high", &raw.2)?,
        low: parse_decimal("low", &raw.3)?,
        close: parse_decimal("close", &raw.4)?,
        volume: parse_decimal("volume", &raw.5)?,
        close_time: Utc
            .timestamp_millis_opt(raw.6)
            .single()
            .ok_or_else(|| ApiError::InvalidData(format!("Invalid close_time: {}", raw.6)))?,
    })
}

#[async_trait]
impl ApiClient for BinanceSpotClient {
    async fn get_ticker(&self, symbol: &str) -> Result<Ticker, ApiError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await?;
        Self::read_body(response).await
    }

    async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<Kline>, ApiError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let raw: Vec<RawKline> = Self::read_body(response).await?;
        debug!(symbol, interval, count = raw.len(), "Fetched klines.");
        raw.into_iter().map(into_kline).collect()
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderResponse, ApiError> {
        let mut params = BTreeMap::new();
        params.insert("symbol", order.symbol.clone());
        params.insert("side", side_param(order.side).to_string());
        params.insert("type", "MARKET".to_string());
        params.insert("quantity", order.quantity.normalize().to_string());
        params.insert("newClientOrderId", order.client_order_id.simple().to_string());
        params.insert("newOrderRespType", "FULL".to_string());

        self.post_signed("/api/v3/order", &mut params).await
    }
}
