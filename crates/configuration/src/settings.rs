use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub indicators: IndicatorParams,
    /// Per-symbol trading parameters, keyed by exchange symbol (e.g. "SOLUSDC").
    #[serde(default)]
    pub trading_pairs: HashMap<String, PairConfig>,
    /// Used for any symbol missing from `trading_pairs`.
    #[serde(default)]
    pub default_pair: PairConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection details for the exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// Short name recorded on every trade (e.g. "binance").
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// When false, orders are filled by the simulated executor.
    #[serde(default)]
    pub live_trading_enabled: bool,
}

/// Longest rolling price window a trading pair keeps.
pub const MAX_WINDOW_CAPACITY: usize = 24;

/// Timers, cooldowns and data-fetch parameters of the trading loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// How often market data is polled and signals evaluated.
    pub polling_interval_secs: u64,
    /// How often the monitor timer fires.
    pub monitor_interval_secs: u64,
    /// Minimum spacing between two risk-exit sweeps, whichever timer triggers them.
    pub analysis_interval_secs: u64,
    /// How often volatility-scaled parameters are recomputed.
    pub param_refresh_interval_secs: u64,
    /// Cooldown between two trades on the same symbol.
    pub min_trade_interval_secs: u64,
    /// Upper bound on a single order call.
    pub order_timeout_secs: u64,
    pub kline_interval: String,
    pub kline_limit: u16,
    /// Capacity of the per-symbol rolling price window, at most
    /// [`MAX_WINDOW_CAPACITY`].
    pub window_capacity: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            polling_interval_secs: 300,
            monitor_interval_secs: 60,
            analysis_interval_secs: 60,
            param_refresh_interval_secs: 3600,
            min_trade_interval_secs: 300,
            order_timeout_secs: 10,
            kline_interval: "1m".to_string(),
            kline_limit: 300,
            window_capacity: 24,
        }
    }
}

/// Look-back periods for the indicator engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    /// Number of closes the short-term trend is measured over.
    pub short_trend_len: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_multiplier: 2.0,
            short_trend_len: 6,
        }
    }
}

/// Trading parameters of a single symbol.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PairConfig {
    /// Quantity of the base asset bought per entry.
    pub trade_amount: Decimal,
    pub max_position_size: Decimal,
    /// Loss, in percent of entry, that triggers a stop-loss exit.
    pub stop_loss_pct: Decimal,
    /// Gain, in percent of entry, that triggers a take-profit exit.
    pub take_profit_pct: Decimal,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            trade_amount: dec!(0.1),
            max_position_size: dec!(1),
            stop_loss_pct: dec!(30),
            take_profit_pct: dec!(20),
        }
    }
}

impl PairConfig {
    pub fn validate(&self, symbol: &str) -> Result<(), ConfigError> {
        if self.trade_amount <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "{symbol}: trade_amount must be positive, got {}",
                self.trade_amount
            )));
        }
        if self.trade_amount > self.max_position_size {
            return Err(ConfigError::ValidationError(format!(
                "{symbol}: trade_amount {} exceeds max_position_size {}",
                self.trade_amount, self.max_position_size
            )));
        }
        if self.stop_loss_pct <= Decimal::ZERO || self.take_profit_pct <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "{symbol}: stop_loss_pct and take_profit_pct must be positive"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the CSV trade log.
    pub trades_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            trades_dir: PathBuf::from("data/trades"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "spot-sentinel.log".to_string(),
        }
    }
}

impl Config {
    /// Parameters for `symbol`, falling back to `default_pair`.
    pub fn pair(&self, symbol: &str) -> &PairConfig {
        self.trading_pairs.get(symbol).unwrap_or(&self.default_pair)
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("polling_interval_secs", self.system.polling_interval_secs),
            ("monitor_interval_secs", self.system.monitor_interval_secs),
            ("param_refresh_interval_secs", self.system.param_refresh_interval_secs),
            ("order_timeout_secs", self.system.order_timeout_secs),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "system.{name} must be greater than zero"
                )));
            }
        }
        if self.system.window_capacity == 0 || self.system.window_capacity > MAX_WINDOW_CAPACITY {
            return Err(ConfigError::ValidationError(format!(
                "system.window_capacity must be between 1 and {MAX_WINDOW_CAPACITY}"
            )));
        }

        let ind = &self.indicators;
        if ind.macd_fast == 0 || ind.macd_slow == 0 || ind.macd_signal == 0 {
            return Err(ConfigError::ValidationError(
                "indicator periods must be greater than zero".to_string(),
            ));
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(ConfigError::ValidationError(format!(
                "indicators.macd_fast ({}) must be shorter than macd_slow ({})",
                ind.macd_fast, ind.macd_slow
            )));
        }

        self.default_pair.validate("default_pair")?;
        for (symbol, pair) in &self.trading_pairs {
            pair.validate(symbol)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Config {
        Config {
            exchange: ExchangeConfig {
                name: "binance".to_string(),
                base_url: "https://api.binance.com".to_string(),
                api_key: String::new(),
                api_secret: String::new(),
                live_trading_enabled: false,
            },
            system: SystemConfig::default(),
            indicators: IndicatorParams::default(),
            trading_pairs: HashMap::new(),
            default_pair: PairConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn unknown_symbol_falls_back_to_default_pair() {
        let mut config = minimal();
        config.trading_pairs.insert(
            "SOLUSDC".to_string(),
            PairConfig {
                trade_amount: dec!(0.5),
                max_position_size: dec!(5),
                stop_loss_pct: dec!(5),
                take_profit_pct: dec!(5),
            },
        );

        assert_eq!(config.pair("SOLUSDC").trade_amount, dec!(0.5));
        assert_eq!(config.pair("DOGEUSDC"), &PairConfig::default());
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(minimal().validate().is_ok());
    }

    #[test]
    fn oversized_trade_amount_is_rejected() {
        let mut config = minimal();
        config.default_pair.trade_amount = dec!(2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = minimal();
        config.system.polling_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn window_capacity_is_capped() {
        let mut config = minimal();
        config.system.window_capacity = MAX_WINDOW_CAPACITY;
        assert!(config.validate().is_ok());

        config.system.window_capacity = MAX_WINDOW_CAPACITY + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
