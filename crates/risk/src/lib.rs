//! # Risk Crate
//!
//! Decides how much to buy when a position opens and when an open position
//! must be closed for risk reasons.
//!
//! ## Public API
//!
//! - `RiskManager`: the trait the engine consults.
//! - `SimpleRiskManager`: fixed-size entries, percentage take-profit/stop-loss exits.
//! - `DynamicParams`: volatility-scaled thresholds derived from a price window.

pub mod dynamic;
pub mod error;
pub mod simple_manager;

pub use dynamic::DynamicParams;
pub use error::RiskError;
pub use simple_manager::SimpleRiskManager;

use configuration::PairConfig;
use core_types::{ExitReason, Pnl, Trade};
use rust_decimal::Decimal;

/// Why and at what profit an open trade should be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitDecision {
    pub reason: ExitReason,
    pub pnl: Pnl,
}

pub trait RiskManager: Send + Sync {
    /// The quantity to buy when opening a position on a pair, or an error if the
    /// pair's configuration does not allow one.
    fn entry_quantity(&self, pair: &PairConfig) -> Result<Decimal, RiskError>;

    /// Checks an open trade against the pair's exit thresholds at `price`.
    ///
    /// `Ok(None)` means the trade should stay open.
    fn assess_exit(
        &self,
        trade: &Trade,
        price: Decimal,
        pair: &PairConfig,
    ) -> Result<Option<ExitDecision>, RiskError>;
}
