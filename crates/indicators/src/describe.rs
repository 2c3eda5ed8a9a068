//! Human-readable classifications used by the market report.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricePosition {
    AboveUpperBand,
    BelowLowerBand,
    InsideBands,
}

impl fmt::Display for PricePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PricePosition::AboveUpperBand => "above upper band",
            PricePosition::BelowLowerBand => "below lower band",
            PricePosition::InsideBands => "inside bands",
        })
    }
}

pub fn price_position(price: f64, upper: f64, lower: f64) -> PricePosition {
    if price > upper {
        PricePosition::AboveUpperBand
    } else if price < lower {
        PricePosition::BelowLowerBand
    } else {
        PricePosition::InsideBands
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendStrength {
    StrongUptrend,
    StrongDowntrend,
    ShortTermRebound,
    ShortTermPullback,
    Sideways,
}

impl fmt::Display for TrendStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendStrength::StrongUptrend => "strong uptrend",
            TrendStrength::StrongDowntrend => "strong downtrend",
            TrendStrength::ShortTermRebound => "short-term rebound",
            TrendStrength::ShortTermPullback => "short-term pullback",
            TrendStrength::Sideways => "sideways",
        })
    }
}

/// Combines a short and a long trend reading (both in percent).
pub fn trend_strength(short_term: f64, long_term: f64) -> TrendStrength {
    match (short_term > 0.0, short_term < 0.0, long_term > 0.0, long_term < 0.0) {
        (true, _, true, _) => TrendStrength::StrongUptrend,
        (_, true, _, true) => TrendStrength::StrongDowntrend,
        (true, _, _, true) => TrendStrength::ShortTermRebound,
        (_, true, true, _) => TrendStrength::ShortTermPullback,
        _ => TrendStrength::Sideways,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeStatus {
    Surging,
    Rising,
    Collapsing,
    Falling,
    Steady,
}

impl fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VolumeStatus::Surging => "surging",
            VolumeStatus::Rising => "rising",
            VolumeStatus::Collapsing => "collapsing",
            VolumeStatus::Falling => "falling",
            VolumeStatus::Steady => "steady",
        })
    }
}

/// Classifies `volume` against an average. A zero average reads as steady.
pub fn volume_status(volume: f64, average: f64) -> VolumeStatus {
    if average == 0.0 {
        return VolumeStatus::Steady;
    }
    let change = (volume - average) / average * 100.0;
    if change > 50.0 {
        VolumeStatus::Surging
    } else if change > 20.0 {
        VolumeStatus::Rising
    } else if change < -50.0 {
        VolumeStatus::Collapsing
    } else if change < -20.0 {
        VolumeStatus::Falling
    } else {
        VolumeStatus::Steady
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityStatus {
    High,
    Moderate,
    Low,
}

impl fmt::Display for VolatilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VolatilityStatus::High => "high",
            VolatilityStatus::Moderate => "moderate",
            VolatilityStatus::Low => "low",
        })
    }
}

pub fn volatility_status(volatility: f64) -> VolatilityStatus {
    if volatility > 5.0 {
        VolatilityStatus::High
    } else if volatility > 2.0 {
        VolatilityStatus::Moderate
    } else {
        VolatilityStatus::Low
    }
}
