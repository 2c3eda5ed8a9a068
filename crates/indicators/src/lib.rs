//! # Indicator Engine
//!
//! Pure functions mapping a price or volume series (oldest first) to indicator
//! values. Nothing in this crate holds state.
//!
//! Each function documents how it behaves on short input. The general rule is
//! that insufficient data produces a neutral value rather than an error, so a
//! caller evaluating trading rules degrades towards "no signal".

pub mod bands;
pub mod describe;
pub mod momentum;
pub mod trend;

pub use bands::{BollingerBands, bollinger_bands, sma};
pub use describe::{
    PricePosition, TrendStrength, VolatilityStatus, VolumeStatus, price_position, trend_strength,
    volatility_status, volume_status,
};
pub use momentum::{Macd, RSI_PERIOD, ema, macd, rsi};
pub use trend::{SupportResistance, support_resistance, trend, volatility};

/// Rounds to eight decimal places, the precision exchanges quote indicators at.
pub(crate) fn round8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}
