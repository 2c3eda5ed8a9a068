use crate::round8;

/// Simple average of the whole slice; `None` when empty.
pub fn sma(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Bollinger Bands over the last `period` prices. Every band is `None` when the
/// series is shorter than the period.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BollingerBands {
    pub upper: Option<f64>,
    pub middle: Option<f64>,
    pub lower: Option<f64>,
}

impl BollingerBands {
    /// Distance between the outer bands.
    pub fn width(&self) -> Option<f64> {
        Some(self.upper? - self.lower?)
    }
}

pub fn bollinger_bands(prices: &[f64], period: usize, multiplier: f64) -> BollingerBands {
    if period == 0 || prices.len() < period {
        return BollingerBands::default();
    }

    let window = &prices[prices.len() - period..];
    let Some(middle) = sma(window) else {
        return BollingerBands::default();
    };
    let variance = window.iter().map(|p| (p - middle).powi(2)).sum::<f64>() / period as f64;
    let deviation = variance.sqrt() * multiplier;

    BollingerBands {
        upper: Some(round8(middle + deviation)),
        middle: Some(round8(middle)),
        lower: Some(round8(middle - deviation)),
    }
}
