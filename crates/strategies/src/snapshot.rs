use crate::error::StrategyError;
use configuration::IndicatorParams;
use core_types::Kline;
use indicators::{BollingerBands, Macd};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Indicator readings for one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub price: f64,
    /// `None` makes every rule that reads it evaluate to false.
    pub rsi: Option<f64>,
    pub macd: Macd,
    pub bollinger: BollingerBands,
    pub volume: f64,
    pub short_term_trend: f64,
    pub support: f64,
    pub resistance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub price: f64,
    pub volume: f64,
}

/// Everything the rule evaluator looks at, computed once per cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub current: IndicatorSet,
    /// Readings as of one candle earlier.
    pub previous: IndicatorSet,
    pub price_before_previous: PricePoint,
    pub market_volatility: f64,
    pub previous_market_volatility: f64,
}

impl MarketSnapshot {
    /// Builds a snapshot from candles in ascending time order.
    ///
    /// Returns `Ok(None)` when there are fewer candles than the slow MACD period,
    /// which is the point below which the indicators carry no information.
    pub fn from_klines(
        klines: &[Kline],
        params: &IndicatorParams,
    ) -> Result<Option<Self>, StrategyError> {
        let required = Self::required_candles(params);
        if klines.len() < required {
            return Ok(None);
        }

        let closes = klines
            .iter()
            .map(|k| to_f64(k.close, "close"))
            .collect::<Result<Vec<_>, _>>()?;
        let volumes = klines
            .iter()
            .map(|k| to_f64(k.volume, "volume"))
            .collect::<Result<Vec<_>, _>>()?;

        let n = closes.len();
        let previous_closes = &closes[..n - 1];

        Ok(Some(Self {
            current: indicator_set(&closes, volumes[n - 1], params),
            previous: indicator_set(previous_closes, volumes[n - 2], params),
            price_before_previous: PricePoint {
                price: closes[n - 3],
                volume: volumes[n - 3],
            },
            market_volatility: indicators::volatility(&closes),
            previous_market_volatility: indicators::volatility(previous_closes),
        }))
    }

    /// Minimum number of candles `from_klines` needs to produce a snapshot.
    pub fn required_candles(params: &IndicatorParams) -> usize {
        params.macd_slow.max(3)
    }
}

fn indicator_set(closes: &[f64], volume: f64, params: &IndicatorParams) -> IndicatorSet {
    let price = closes.last().copied().unwrap_or_default();
    let short_window = &closes[closes.len().saturating_sub(params.short_trend_len)..];
    let levels = indicators::support_resistance(closes);

    IndicatorSet {
        price,
        rsi: Some(indicators::rsi(closes, params.rsi_period)),
        macd: indicators::macd(closes, params.macd_fast, params.macd_slow, params.macd_signal),
        bollinger: indicators::bollinger_bands(
            closes,
            params.bollinger_period,
            params.bollinger_multiplier,
        ),
        volume,
        short_term_trend: indicators::trend(short_window),
        support: levels.map_or(price, |l| l.support),
        resistance: levels.map_or(price, |l| l.resistance),
    }
}

fn to_f64(value: Decimal, field: &str) -> Result<f64, StrategyError> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| StrategyError::InvalidData(format!("{field} {value} is not representable")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn klines(closes: &[Decimal]) -> Vec<Kline> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                Kline::synthetic(*close, Decimal::from(i as i64 + 1), start + Duration::hours(i as i64))
            })
            .collect()
    }

    #[test]
    fn too_few_candles_yield_no_snapshot() {
        let series: Vec<Decimal> = (0..25).map(|i| Decimal::from(100 + i)).collect();
        let snapshot = MarketSnapshot::from_klines(&klines(&series), &IndicatorParams::default());
        assert!(snapshot.unwrap().is_none());
    }

    #[test]
    fn previous_set_lags_current_by_one_candle() {
        let series: Vec<Decimal> = (0..30).map(|i| Decimal::from(100 + i)).collect();
        let snapshot = MarketSnapshot::from_klines(&klines(&series), &IndicatorParams::default())
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.current.price, 129.0);
        assert_eq!(snapshot.previous.price, 128.0);
        assert_eq!(snapshot.price_before_previous.price, 127.0);
        assert_eq!(snapshot.current.volume, 30.0);
        assert_eq!(snapshot.previous.volume, 29.0);
        assert_eq!(snapshot.current.support, 100.0);
        assert_eq!(snapshot.current.resistance, 129.0);
        assert_eq!(snapshot.previous.resistance, 128.0);
    }

    #[test]
    fn short_term_trend_uses_last_six_closes() {
        let mut series: Vec<Decimal> = vec![dec!(50); 24];
        series.extend([dec!(100), dec!(101), dec!(102), dec!(103), dec!(104), dec!(110)]);
        let snapshot = MarketSnapshot::from_klines(&klines(&series), &IndicatorParams::default())
            .unwrap()
            .unwrap();

        assert!((snapshot.current.short_term_trend - 10.0).abs() < 1e-9);
        // Previous window is [50, 100, 101, 102, 103, 104].
        assert!((snapshot.previous.short_term_trend - 108.0).abs() < 1e-9);
    }
}
