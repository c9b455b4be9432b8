use thiserror::Error;

use crate::types::Timeframe;

#[derive(Debug, Error)]
pub enum Error {
    /// Series shorter than an indicator's lookback window. Recoverable:
    /// the instrument is skipped for the cycle.
    #[error("not enough {timeframe} candles: need {needed}, have {got}")]
    InsufficientData {
        timeframe: Timeframe,
        needed: usize,
        got: usize,
    },

    /// Series with missing or NaN fields. Same handling as InsufficientData.
    #[error("malformed {timeframe} series for {symbol}")]
    MalformedSeries { symbol: String, timeframe: Timeframe },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("market data provider error: {0}")]
    Provider(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
