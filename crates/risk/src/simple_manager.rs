use crate::error::RiskError;
use crate::{ExitDecision, RiskManager};
use configuration::PairConfig;
use core_types::{ExitReason, Trade};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

/// Fixed-size entries and percentage-threshold exits, both taken straight from
/// the pair's configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleRiskManager;

impl SimpleRiskManager {
    pub fn new() -> Self {
        Self
    }
}

impl RiskManager for SimpleRiskManager {
    fn entry_quantity(&self, pair: &PairConfig) -> Result<Decimal, RiskError> {
        if pair.trade_amount <= dec!(0) {
            return Err(RiskError::InvalidParameters(format!(
                "trade_amount must be positive, got {}",
                pair.trade_amount
            )));
        }
        if pair.trade_amount > pair.max_position_size {
            return Err(RiskError::PositionTooLarge {
                amount: pair.trade_amount,
                max: pair.max_position_size,
            });
        }
        Ok(pair.trade_amount)
    }

    fn assess_exit(
        &self,
        trade: &Trade,
        price: Decimal,
        pair: &PairConfig,
    ) -> Result<Option<ExitDecision>, RiskError> {
        if price <= dec!(0) {
            return Err(RiskError::InvalidPrice(price));
        }

        let pnl = trade.pnl_at(price)?;
        debug!(
            trade_id = %trade.id,
            symbol = %trade.symbol,
            %price,
            pnl_percent = %pnl.percent.round_dp(4),
            "Assessed open trade."
        );

        let reason = if pnl.percent >= pair.take_profit_pct {
            ExitReason::TakeProfit
        } else if pnl.percent <= -pair.stop_loss_pct {
            ExitReason::StopLoss
        } else {
            return Ok(None);
        };

        Ok(Some(ExitDecision { reason, pnl }))
    }
}
