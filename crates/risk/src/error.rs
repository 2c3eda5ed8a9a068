use core_types::CoreError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Risk parameters from configuration are invalid: {0}")]
    InvalidParameters(String),

    #[error("Trade amount {amount} exceeds the maximum position size {max}")]
    PositionTooLarge { amount: Decimal, max: Decimal },

    #[error("The provided price ({0}) is zero or negative.")]
    InvalidPrice(Decimal),

    #[error("A calculation error occurred: {0}")]
    Calculation(#[from] CoreError),
}
