use crate::error::StrategyError;
use crate::rules;
use crate::snapshot::MarketSnapshot;
use crate::Strategy;
use configuration::IndicatorParams;
use core_types::{Kline, Signal};
use tracing::debug;

/// Scores the fixed buy/sell rule tables against a snapshot of the candles.
#[derive(Debug, Clone)]
pub struct RuleBasedStrategy {
    params: IndicatorParams,
}

impl RuleBasedStrategy {
    pub fn new(params: IndicatorParams) -> Result<Self, StrategyError> {
        if params.macd_fast == 0 || params.macd_fast >= params.macd_slow {
            return Err(StrategyError::InvalidParameters(format!(
                "MACD fast period ({}) must be positive and shorter than the slow period ({})",
                params.macd_fast, params.macd_slow
            )));
        }
        if params.rsi_period == 0 || params.bollinger_period == 0 || params.short_trend_len < 2 {
            return Err(StrategyError::InvalidParameters(
                "RSI and Bollinger periods must be positive and the trend window at least 2"
                    .to_string(),
            ));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }
}

impl Strategy for RuleBasedStrategy {
    fn evaluate(&self, klines: &[Kline]) -> Result<Signal, StrategyError> {
        let Some(snapshot) = MarketSnapshot::from_klines(klines, &self.params)? else {
            debug!(
                candles = klines.len(),
                required = MarketSnapshot::required_candles(&self.params),
                "Not enough candles to evaluate rules."
            );
            return Ok(Signal::hold("insufficient history"));
        };

        let signal = rules::evaluate(&snapshot);
        debug!(
            decision = %signal.decision,
            confidence = signal.confidence,
            conditions = ?signal.triggered_conditions,
            "Rules evaluated."
        );
        Ok(signal)
    }
}
