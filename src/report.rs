//! Terminal and JSON renderings for the `analyze` and `trades` commands.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use configuration::IndicatorParams;
use core_types::{Kline, Signal, Trade};
use indicators::{price_position, trend_strength, volatility_status, volume_status};
use risk::DynamicParams;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use strategies::{MarketSnapshot, StrategyError};

/// One-shot indicator readout for a symbol, plus the signal it produces.
#[derive(Debug, Serialize)]
pub struct MarketReport {
    pub symbol: String,
    pub candles: usize,
    pub price: f64,
    pub rsi: Option<f64>,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub bollinger_upper: Option<f64>,
    pub bollinger_middle: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub support: f64,
    pub resistance: f64,
    pub short_term_trend: f64,
    pub long_term_trend: f64,
    pub volatility: f64,
    pub price_position: Option<String>,
    pub trend_strength: String,
    pub volume_status: String,
    pub volatility_status: String,
    pub dynamic_params: DynamicParams,
    pub signal: Signal,
}

impl MarketReport {
    /// Returns `Ok(None)` when there are too few candles for a snapshot.
    pub fn build(
        symbol: &str,
        klines: &[Kline],
        params: &IndicatorParams,
        window: usize,
        signal: Signal,
    ) -> Result<Option<Self>, StrategyError> {
        let Some(snapshot) = MarketSnapshot::from_klines(klines, params)? else {
            return Ok(None);
        };
        let current = &snapshot.current;

        let closes: Vec<f64> = klines.iter().filter_map(|k| k.close.to_f64()).collect();
        let volumes: Vec<f64> = klines.iter().filter_map(|k| k.volume.to_f64()).collect();
        let long_term_trend = indicators::trend(&closes);
        let average_volume = indicators::sma(&volumes).unwrap_or(0.0);
        let recent = &closes[closes.len().saturating_sub(window)..];

        let bands = current.bollinger;
        let position = match (bands.upper, bands.lower) {
            (Some(upper), Some(lower)) => {
                Some(price_position(current.price, upper, lower).to_string())
            }
            _ => None,
        };

        Ok(Some(Self {
            symbol: symbol.to_string(),
            candles: klines.len(),
            price: current.price,
            rsi: current.rsi,
            macd_line: current.macd.line,
            macd_signal: current.macd.signal,
            macd_histogram: current.macd.histogram,
            bollinger_upper: bands.upper,
            bollinger_middle: bands.middle,
            bollinger_lower: bands.lower,
            support: current.support,
            resistance: current.resistance,
            short_term_trend: current.short_term_trend,
            long_term_trend,
            volatility: snapshot.market_volatility,
            price_position: position,
            trend_strength: trend_strength(current.short_term_trend, long_term_trend).to_string(),
            volume_status: volume_status(current.volume, average_volume).to_string(),
            volatility_status: volatility_status(snapshot.market_volatility).to_string(),
            dynamic_params: DynamicParams::from_prices(recent),
            signal,
        }))
    }

    pub fn to_table(&self) -> Table {
        fn opt(value: Option<f64>) -> String {
            value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![Cell::new(&self.symbol), Cell::new("Value")]);

        let rows = [
            ("Candles", self.candles.to_string()),
            ("Price", format!("{:.4}", self.price)),
            ("RSI", opt(self.rsi)),
            ("MACD line", format!("{:.8}", self.macd_line)),
            ("MACD signal", format!("{:.8}", self.macd_signal)),
            ("MACD histogram", format!("{:.8}", self.macd_histogram)),
            ("Bollinger upper", opt(self.bollinger_upper)),
            ("Bollinger middle", opt(self.bollinger_middle)),
            ("Bollinger lower", opt(self.bollinger_lower)),
            ("Support", format!("{:.4}", self.support)),
            ("Resistance", format!("{:.4}", self.resistance)),
            ("Short-term trend %", format!("{:.2}", self.short_term_trend)),
            ("Long-term trend %", format!("{:.2}", self.long_term_trend)),
            ("Volatility %", format!("{:.4}", self.volatility)),
            (
                "Price position",
                self.price_position.clone().unwrap_or_else(|| "n/a".to_string()),
            ),
            ("Trend", self.trend_strength.clone()),
            ("Volume", self.volume_status.clone()),
            ("Volatility", self.volatility_status.clone()),
            (
                "Dynamic RSI band",
                format!(
                    "{:.1} / {:.1}",
                    self.dynamic_params.rsi_lower_threshold, self.dynamic_params.rsi_upper_threshold
                ),
            ),
            ("Decision", self.signal.decision.to_string()),
            ("Confidence", format!("{:.2}", self.signal.confidence)),
            ("Reasoning", self.signal.reasoning.clone()),
        ];
        for (name, value) in rows {
            table.add_row(vec![Cell::new(name), Cell::new(value)]);
        }
        table
    }
}

/// Renders persisted trades, one row each.
pub fn trades_table(trades: &[Trade]) -> Table {
    fn opt<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Symbol", "Status", "Opened", "Entry", "Amount", "Closed", "Exit", "Reason", "PnL %",
            "PnL",
        ]);

    for trade in trades {
        table.add_row(vec![
            trade.symbol.clone(),
            trade.status.to_string(),
            trade.open_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            trade.entry_price.to_string(),
            trade.amount.to_string(),
            opt(trade.close_time.map(|t| t.format("%Y-%m-%d %H:%M:%S"))),
            opt(trade.exit_price),
            opt(trade.exit_reason),
            opt(trade.pnl_percent),
            opt(trade.pnl_amount),
        ]);
    }
    table
}
