//! Fixed buy/sell rule tables and the evaluator that scores them.

use crate::snapshot::{IndicatorSet, MarketSnapshot};
use core_types::{Decision, Signal};

/// A named predicate over a snapshot.
#[derive(Clone, Copy)]
pub struct Condition {
    pub name: &'static str,
    pub holds: fn(&MarketSnapshot) -> bool,
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Condition").field(&self.name).finish()
    }
}

type Bonus = fn(Decision, &MarketSnapshot) -> bool;

/// Confidence gained per triggered condition or bonus.
const CONFIDENCE_STEP: f64 = 0.1;

pub static BUY_CONDITIONS: [Condition; 7] = [
    Condition {
        name: "RSI oversold with MACD turning positive",
        holds: |s| rsi_below(&s.current, 40.0) && s.current.macd.histogram > 0.0,
    },
    Condition {
        name: "Near support with rising volume",
        holds: |s| within(s.current.price, s.current.support, 0.03) && volume_rising(s),
    },
    Condition {
        name: "Lower band support with trend turning up",
        holds: |s| {
            s.current.bollinger.lower.is_some_and(|lower| within(s.current.price, lower, 0.02))
                && s.current.short_term_trend > 0.0
                && s.previous.short_term_trend <= 0.0
        },
    },
    Condition {
        name: "MACD golden cross with rising volume",
        holds: |s| {
            s.current.macd.line > s.current.macd.signal
                && s.previous.macd.line <= s.previous.macd.signal
                && volume_rising(s)
        },
    },
    Condition {
        name: "Consecutive gains with RSI not overbought",
        holds: |s| {
            s.current.price > s.previous.price
                && s.previous.price > s.price_before_previous.price
                && rsi_below(&s.current, 65.0)
        },
    },
    Condition {
        name: "Break above middle band with rising volume",
        holds: |s| crossed_middle_band(s, Decision::Buy) && volume_rising(s),
    },
    Condition {
        name: "Short-term uptrend with RSI not overbought",
        holds: |s| s.current.short_term_trend > 0.0 && rsi_below(&s.current, 60.0),
    },
];

pub static SELL_CONDITIONS: [Condition; 7] = [
    Condition {
        name: "RSI overbought with MACD turning negative",
        holds: |s| rsi_above(&s.current, 60.0) && s.current.macd.histogram < 0.0,
    },
    Condition {
        name: "Near resistance with rising volume",
        holds: |s| within(s.current.price, s.current.resistance, 0.03) && volume_rising(s),
    },
    Condition {
        name: "Upper band resistance with trend turning down",
        holds: |s| {
            s.current.bollinger.upper.is_some_and(|upper| within(s.current.price, upper, 0.02))
                && s.current.short_term_trend < 0.0
                && s.previous.short_term_trend >= 0.0
        },
    },
    Condition {
        name: "MACD death cross with rising volume",
        holds: |s| {
            s.current.macd.line < s.current.macd.signal
                && s.previous.macd.line >= s.previous.macd.signal
                && volume_rising(s)
        },
    },
    Condition {
        name: "Consecutive losses with RSI not oversold",
        holds: |s| {
            s.current.price < s.previous.price
                && s.previous.price < s.price_before_previous.price
                && rsi_above(&s.current, 35.0)
        },
    },
    Condition {
        name: "Break below middle band with rising volume",
        holds: |s| crossed_middle_band(s, Decision::Sell) && volume_rising(s),
    },
    Condition {
        name: "Short-term downtrend with RSI not oversold",
        holds: |s| s.current.short_term_trend < 0.0 && rsi_above(&s.current, 40.0),
    },
];

static BONUS_CONDITIONS: [Bonus; 4] = [
    // Volume rising two periods in a row.
    |_, s| volume_rising(s) && s.previous.volume > s.price_before_previous.volume,
    // Bands opening for a buy, closing for a sell.
    |decision, s| match (s.current.bollinger.width(), s.previous.bollinger.width()) {
        (Some(current), Some(previous)) => match decision {
            Decision::Buy => current > previous,
            _ => current < previous,
        },
        _ => false,
    },
    // Price through the opposite-side level.
    |decision, s| match decision {
        Decision::Buy => s.current.price > s.current.resistance,
        _ => s.current.price < s.current.support,
    },
    |_, s| s.market_volatility > s.previous_market_volatility,
];

fn rsi_below(set: &IndicatorSet, threshold: f64) -> bool {
    set.rsi.is_some_and(|rsi| rsi < threshold)
}

fn rsi_above(set: &IndicatorSet, threshold: f64) -> bool {
    set.rsi.is_some_and(|rsi| rsi > threshold)
}

fn volume_rising(s: &MarketSnapshot) -> bool {
    s.current.volume > s.previous.volume
}

/// Price crossed the middle band upwards (buy) or downwards (sell) since the
/// previous candle.
fn crossed_middle_band(s: &MarketSnapshot, direction: Decision) -> bool {
    let (Some(middle), Some(prev_middle)) = (s.current.bollinger.middle, s.previous.bollinger.middle)
    else {
        return false;
    };
    match direction {
        Decision::Buy => s.current.price > middle && s.previous.price <= prev_middle,
        _ => s.current.price < middle && s.previous.price >= prev_middle,
    }
}

/// True when `price` is within `tolerance` (a fraction) of a positive `level`.
fn within(price: f64, level: f64, tolerance: f64) -> bool {
    level > 0.0 && ((price - level).abs() / level) < tolerance
}

fn triggered(conditions: &[Condition], snapshot: &MarketSnapshot) -> Vec<String> {
    conditions
        .iter()
        .filter(|c| (c.holds)(snapshot))
        .map(|c| c.name.to_string())
        .collect()
}

/// Scores a snapshot against both rule tables.
///
/// Buy and sell firing together is treated as no signal. Otherwise the firing
/// side wins, its confidence growing with the number of triggered conditions and
/// bonus factors, capped at 1.
pub fn evaluate(snapshot: &MarketSnapshot) -> Signal {
    let buys = triggered(&BUY_CONDITIONS, snapshot);
    let sells = triggered(&SELL_CONDITIONS, snapshot);

    let (decision, conditions, side) = match (buys.is_empty(), sells.is_empty()) {
        (false, false) => return Signal::hold("conflicting signals"),
        (true, true) => return Signal::hold("no signal"),
        (false, true) => (Decision::Buy, buys, "buy"),
        (true, false) => (Decision::Sell, sells, "sell"),
    };

    let bonus = BONUS_CONDITIONS
        .iter()
        .filter(|bonus| bonus(decision, snapshot))
        .count();
    let confidence = ((conditions.len() + bonus) as f64 * CONFIDENCE_STEP).min(1.0);

    let mut reasoning = format!(
        "Triggered {} {side} condition(s): {}",
        conditions.len(),
        conditions.join(", ")
    );
    if bonus > 0 {
        reasoning.push_str(&format!("\nPlus {bonus} bonus factor(s)"));
    }

    Signal {
        decision,
        confidence,
        reasoning,
        triggered_conditions: conditions,
    }
}
