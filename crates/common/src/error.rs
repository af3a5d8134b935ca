use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed bar series for {instrument}: {reason}")]
    MalformedBar { instrument: String, reason: String },

    #[error("Journal storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dispatch failure: {0}")]
    Dispatch(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
