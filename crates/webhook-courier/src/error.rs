//! Error types for the webhook courier.

use crate::job::DeliveryState;
use thiserror::Error;

/// Courier error type.
#[derive(Error, Debug)]
pub enum CourierError {
    /// Configuration error (rejected at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid webhook URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP transport error (connect, timeout, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Downstream answered with a non-2xx status
    #[error("Downstream returned HTTP {0}")]
    Status(u16),

    /// Payload could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A job was asked to move between states it cannot move between
    #[error("Invalid delivery transition: {from} -> {to}")]
    InvalidTransition {
        from: DeliveryState,
        to: DeliveryState,
    },
}

/// Result type for courier operations.
pub type CourierResult<T> = Result<T, CourierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_names_both_states() {
        let err = CourierError::InvalidTransition {
            from: DeliveryState::Exhausted,
            to: DeliveryState::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Invalid delivery transition: exhausted -> pending"
        );
    }
}
