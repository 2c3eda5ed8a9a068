use chrono::{DateTime, Utc};
use core_types::Kline;
use risk::DynamicParams;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::VecDeque;

/// Rolling market state of one symbol.
#[derive(Debug, Clone)]
pub struct TradingPairState {
    pub symbol: String,
    pub exchange: String,
    window: VecDeque<Kline>,
    capacity: usize,
    pub last_price: Option<Decimal>,
    pub last_update: Option<DateTime<Utc>>,
    pub dynamic_params: DynamicParams,
}

impl TradingPairState {
    pub fn new(symbol: &str, exchange: &str, capacity: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            exchange: exchange.to_string(),
            window: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(1),
            last_price: None,
            last_update: None,
            dynamic_params: DynamicParams::default(),
        }
    }

    /// Appends a synthetic candle at `price`, evicting the oldest candles once
    /// the window is over capacity.
    pub fn record_tick(&mut self, price: Decimal, volume: Decimal, at: DateTime<Utc>) {
        self.window.push_back(Kline::synthetic(price, volume, at));
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
        self.last_price = Some(price);
        self.last_update = Some(at);
    }

    pub fn window(&self) -> &VecDeque<Kline> {
        &self.window
    }

    pub fn window_closes(&self) -> Vec<f64> {
        self.window
            .iter()
            .filter_map(|k| k.close.to_f64())
            .collect()
    }

    /// Recomputes the volatility-scaled parameters from the current window.
    pub fn refresh_dynamic_params(&mut self) -> DynamicParams {
        self.dynamic_params = DynamicParams::from_prices(&self.window_closes());
        self.dynamic_params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    #[test]
    fn window_evicts_oldest_first() {
        let start = Utc::now();
        let mut state = TradingPairState::new("SOLUSDC", "binance", 24);

        for i in 0..25 {
            state.record_tick(Decimal::from(100 + i), Decimal::ONE, start + Duration::minutes(i));
        }

        assert_eq!(state.window().len(), 24);
        assert_eq!(state.window().front().map(|k| k.close), Some(Decimal::from(101)));
        assert_eq!(state.window().back().map(|k| k.close), Some(Decimal::from(124)));
        assert_eq!(state.last_price, Some(Decimal::from(124)));
    }

    #[test]
    fn flat_window_keeps_default_params() {
        let mut state = TradingPairState::new("SOLUSDC", "binance", 24);
        for _ in 0..5 {
            state.record_tick(Decimal::from(100), Decimal::ONE, Utc::now());
        }
        assert_eq!(state.refresh_dynamic_params(), DynamicParams::default());
    }
}
