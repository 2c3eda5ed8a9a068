use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Exchange rejected the request ({code}): {msg}")]
    Exchange { code: i64, msg: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Failed to sign the request: {0}")]
    Signing(String),

    #[error("Client is misconfigured: {0}")]
    Configuration(String),
}
