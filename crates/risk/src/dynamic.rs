use serde::Serialize;

/// Volatility-scaled thresholds for a pair. Reported alongside the pair's
/// state; exits use the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DynamicParams {
    pub rsi_lower_threshold: f64,
    pub rsi_upper_threshold: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for DynamicParams {
    fn default() -> Self {
        Self {
            rsi_lower_threshold: 30.0,
            rsi_upper_threshold: 70.0,
            stop_loss_pct: 2.0,
            take_profit_pct: 4.0,
        }
    }
}

impl DynamicParams {
    /// Widens the RSI band and the take-profit as volatility rises, and
    /// tightens the stop-loss. Falls back to the defaults when the prices
    /// carry no volatility reading.
    pub fn from_prices(prices: &[f64]) -> Self {
        let v = indicators::volatility(prices);
        if !v.is_finite() {
            return Self::default();
        }

        Self {
            rsi_lower_threshold: (30.0 - v * 5.0).max(20.0),
            rsi_upper_threshold: (70.0 + v * 5.0).min(80.0),
            stop_loss_pct: (2.0 - v * 2.0).max(1.0),
            take_profit_pct: (4.0 + v * 2.0).max(2.0),
        }
    }
}
