use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unrecognized timeframe identifier: {0}")]
    InvalidTimeframe(String),
}

pub type Result<T> = std::result::Result<T, Error>;
