use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API returned status {status} for {endpoint}")]
    ApiStatus { status: u16, endpoint: String },
    #[error("Unsupported timeframe: {0}")]
    UnsupportedTimeframe(String),
}

pub type Result<T> = std::result::Result<T, Error>;
