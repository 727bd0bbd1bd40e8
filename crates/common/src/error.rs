use thiserror::Error;

use crate::Granularity;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("OANDA API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(
        "Insufficient data for {instrument} {granularity}: {available} complete candles, need {required}"
    )]
    InsufficientData {
        instrument: String,
        granularity: Granularity,
        available: usize,
        required: usize,
    },

    #[error("EMA undefined for {instrument} {granularity}")]
    UndefinedEma {
        instrument: String,
        granularity: Granularity,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for coverage gaps (not enough history) as opposed to real failures.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Error::InsufficientData { .. } | Error::UndefinedEma { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
