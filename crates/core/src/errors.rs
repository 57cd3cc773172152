//! Core error types.

use stockwatch_market_data::MarketDataError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Failure while talking to the brokerage upstream, including
    /// credential problems. A cache miss is never one of these.
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    /// The caller's input was rejected before any network or storage work.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}
