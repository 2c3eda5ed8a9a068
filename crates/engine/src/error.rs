use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("API client error: {0}")]
    ApiClient(#[from] api_client::error::ApiError),

    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Execution error: {0}")]
    Execution(#[from] executor::ExecutorError),

    #[error("Trade calculation error: {0}")]
    Core(#[from] core_types::CoreError),

    #[error("Trading pair '{0}' is not tracked by the engine.")]
    UnknownSymbol(String),
}
