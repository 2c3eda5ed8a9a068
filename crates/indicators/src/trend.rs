/// Population standard deviation of simple returns, in percent.
///
/// `NaN` when there are fewer than two prices, since no return exists.
pub fn volatility(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return f64::NAN;
    }

    let returns: Vec<f64> = prices
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

    variance.sqrt() * 100.0
}

/// Percent change from the first to the last price; `0.0` below two prices.
pub fn trend(prices: &[f64]) -> f64 {
    match (prices.first(), prices.last()) {
        (Some(first), Some(last)) if prices.len() >= 2 => (last - first) / first * 100.0,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
}

/// Lowest and highest price of the slice. A single price is both.
pub fn support_resistance(prices: &[f64]) -> Option<SupportResistance> {
    let first = *prices.first()?;
    let (support, resistance) = prices
        .iter()
        .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    Some(SupportResistance {
        support,
        resistance,
    })
}
