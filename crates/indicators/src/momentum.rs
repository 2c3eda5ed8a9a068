use crate::round8;

/// Default look-back for [`rsi`].
pub const RSI_PERIOD: usize = 14;

/// Relative Strength Index over the first `period` price differences.
///
/// Returns the neutral `50.0` when there are fewer than `period + 1` prices.
/// Gains and losses are averaged over the first `period` differences only; this
/// is not Wilder's recursive smoothing. A window with no losses reads `100.0`.
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return 50.0;
    }

    let (gains, losses) = prices[..=period]
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gains, losses), diff| {
            if diff >= 0.0 {
                (gains + diff, losses)
            } else {
                (gains, losses - diff)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Exponential moving average series.
///
/// The first output is the simple average of the first `period` prices and every
/// later price is folded in with `k = 2 / (period + 1)`, so the result holds
/// `len - period + 1` points.
///
/// With fewer than `period` prices the input is returned unchanged. Callers
/// must read that as "insufficient data", not as an EMA.
pub fn ema(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return prices.to_vec();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut current = prices[..period].iter().sum::<f64>() / period as f64;

    let mut series = Vec::with_capacity(prices.len() - period + 1);
    series.push(current);
    for price in &prices[period..] {
        current = (price - current) * k + current;
        series.push(current);
    }
    series
}

/// The last MACD line, signal and histogram values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Moving Average Convergence Divergence.
///
/// Returns all zeros when there are fewer than `slow` prices.
///
/// The intermediate MACD series pairs each fast EMA point with the slow EMA point
/// at the same index and, once the shorter slow series runs out, with the last
/// slow value. The signal line is the EMA of that series. All three outputs are
/// rounded to eight decimals.
pub fn macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    if prices.len() < slow {
        tracing::debug!(
            points = prices.len(),
            required = slow,
            "Not enough data points for MACD, returning zeros."
        );
        return Macd::default();
    }

    let fast_ema = ema(prices, fast);
    let slow_ema = ema(prices, slow);
    let (Some(&last_fast), Some(&last_slow)) = (fast_ema.last(), slow_ema.last()) else {
        return Macd::default();
    };

    let macd_series: Vec<f64> = fast_ema
        .iter()
        .enumerate()
        .map(|(i, fast_value)| fast_value - slow_ema.get(i).copied().unwrap_or(last_slow))
        .collect();

    let signal_series = ema(&macd_series, signal);
    let signal_value = signal_series.last().copied().unwrap_or(0.0);

    let line = last_fast - last_slow;
    let histogram = line - signal_value;
    tracing::debug!(line, signal = signal_value, histogram, "MACD computed.");

    Macd {
        line: round8(line),
        signal: round8(signal_value),
        histogram: round8(histogram),
    }
}
