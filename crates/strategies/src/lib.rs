//! # Strategy Library
//!
//! This crate turns a window of candles into a trading `Signal`.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no databases, APIs or execution. Depends only on
//!   `core-types`, `indicators` and `configuration`.
//! - **Strategy agnostic engine:** the engine drives anything implementing
//!   `Strategy`, so it never sees snapshots or rule tables.
//! - **Fixed rules:** the buy and sell rules are static tables of named
//!   predicates, built at compile time.
//!
//! ## Public API
//!
//! - `Strategy`: the trait the engine calls.
//! - `RuleBasedStrategy`: the rule-table implementation.
//! - `MarketSnapshot`: the indicator readings the rules are evaluated on.
//! - `rules::evaluate`: the snapshot-to-signal scorer.

pub mod error;
pub mod rule_based;
pub mod rules;
pub mod snapshot;

pub use error::StrategyError;
pub use rule_based::RuleBasedStrategy;
pub use snapshot::{IndicatorSet, MarketSnapshot, PricePoint};

use core_types::{Kline, Signal};

/// The core trait that all trading strategies must implement.
///
/// Strategies are stateless: the same candles always produce the same signal.
/// The `Send + Sync` bounds let the engine share one instance across tasks.
pub trait Strategy: Send + Sync {
    /// Evaluates candles in ascending time order.
    ///
    /// Too little history is not an error: it yields a HOLD with zero confidence.
    fn evaluate(&self, klines: &[Kline]) -> Result<Signal, StrategyError>;
}
