use crate::enums::{Decision, Direction, ExitReason, OrderSide, TradeStatus};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One OHLCV sample for a fixed time interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: DateTime<Utc>,
}

impl Kline {
    /// A flat candle whose open, high, low and close all equal `price`.
    pub fn synthetic(price: Decimal, volume: Decimal, at: DateTime<Utc>) -> Self {
        Self {
            open_time: at,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
            close_time: at,
        }
    }
}

/// A request for a single market order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub client_order_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
}

impl OrderRequest {
    /// Builds a market order, rejecting non-positive quantities before anything
    /// reaches the exchange.
    pub fn market(symbol: &str, side: OrderSide, quantity: Decimal) -> Result<Self, CoreError> {
        if quantity <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "quantity".to_string(),
                format!("{} is not a positive amount", quantity),
            ));
        }
        Ok(Self {
            client_order_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side,
            quantity,
        })
    }
}

/// The exchange's acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub order_id: String,
    pub client_order_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Average fill price when the exchange reports one.
    pub avg_price: Option<Decimal>,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// The output of the rule evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub decision: Decision,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub reasoning: String,
    pub triggered_conditions: Vec<String>,
}

impl Signal {
    /// A HOLD with zero confidence and no triggered conditions.
    pub fn hold(reasoning: impl Into<String>) -> Self {
        Self {
            decision: Decision::Hold,
            confidence: 0.0,
            reasoning: reasoning.into(),
            triggered_conditions: Vec::new(),
        }
    }
}

/// Unrealised or realised profit of a trade at a given price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pnl {
    pub percent: Decimal,
    pub amount: Decimal,
}

/// A single position, from the fill that opened it to the fill that closed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    pub exchange: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub amount: Decimal,
    pub status: TradeStatus,
    pub open_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub reason: String,
    pub order_status: String,
    pub exit_price: Option<Decimal>,
    pub exit_reason: Option<ExitReason>,
    pub pnl_percent: Option<Decimal>,
    pub pnl_amount: Option<Decimal>,
}

/// The fields written when a trade transitions to `Closed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePatch {
    pub status: TradeStatus,
    pub close_time: DateTime<Utc>,
    pub exit_price: Decimal,
    pub exit_reason: ExitReason,
    pub pnl_percent: Decimal,
    pub pnl_amount: Decimal,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Profit in percent of the entry price and in quote currency, signed so that
    /// a favourable move is positive for either direction.
    pub fn pnl_at(&self, price: Decimal) -> Result<Pnl, CoreError> {
        if self.entry_price <= Decimal::ZERO {
            return Err(CoreError::Calculation(format!(
                "trade {} has a non-positive entry price {}",
                self.id, self.entry_price
            )));
        }
        let move_pct = match self.direction {
            Direction::Long => (price - self.entry_price) / self.entry_price * dec!(100),
            Direction::Short => (self.entry_price - price) / self.entry_price * dec!(100),
        };
        let amount = move_pct / dec!(100) * self.entry_price * self.amount;
        Ok(Pnl {
            percent: move_pct,
            amount,
        })
    }

    /// Builds the closing patch for an exit at `exit_price`.
    pub fn close_patch(
        &self,
        exit_price: Decimal,
        exit_reason: ExitReason,
        at: DateTime<Utc>,
    ) -> Result<TradePatch, CoreError> {
        let pnl = self.pnl_at(exit_price)?;
        Ok(TradePatch {
            status: TradeStatus::Closed,
            close_time: at,
            exit_price,
            exit_reason,
            pnl_percent: pnl.percent.round_dp(2),
            pnl_amount: pnl.amount.round_dp(8),
        })
    }

    pub fn apply(&mut self, patch: &TradePatch) {
        self.status = patch.status;
        self.close_time = Some(patch.close_time);
        self.exit_price = Some(patch.exit_price);
        self.exit_reason = Some(patch.exit_reason);
        self.pnl_percent = Some(patch.pnl_percent);
        self.pnl_amount = Some(patch.pnl_amount);
    }
}
