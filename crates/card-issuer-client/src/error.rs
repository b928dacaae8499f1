//! Card issuer error types.

use thiserror::Error;

/// Card issuer error type.
#[derive(Error, Debug)]
pub enum IssuerError {
    /// Missing or unusable issuer settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid API URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Inbound request is missing a field or has one of the wrong type
    #[error("{0}")]
    InvalidInput(String),

    /// HTTP request error (connect, timeout, non-JSON body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using IssuerError.
pub type IssuerResult<T> = Result<T, IssuerError>;
