//! Error types for the aggregation library

use thiserror::Error;

/// Failures at construction, configuration and export time.
///
/// Ingest and read paths never fail; they degrade by leaving previously
/// published values in place.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("metrics text is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
