use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Trade store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read or write a trade row: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Trade {id} was not found for {exchange}/{symbol}")]
    NotFound {
        exchange: String,
        symbol: String,
        id: String,
    },

    #[error("Trade store task failed: {0}")]
    Task(String),
}
