//! Proxy error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use card_issuer_client::IssuerError;
use serde_json::json;
use thiserror::Error;
use webhook_courier::CourierError;

/// Proxy error type.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Request body is not a JSON object
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Auth token missing or wrong
    #[error("Unauthorized")]
    Unauthorized,

    /// Required field missing or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Startup configuration rejected
    #[error("Configuration error: {0}")]
    Config(String),

    /// Card issuer setup error
    #[error(transparent)]
    Issuer(#[from] IssuerError),

    /// Courier setup error
    #[error(transparent)]
    Courier(#[from] CourierError),

    /// I/O error (bind, serve)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using ProxyError.
pub type ProxyResult<T> = Result<T, ProxyError>;

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::InvalidJson(message) => {
                json_error(StatusCode::BAD_REQUEST, "Invalid JSON", message)
            }
            ProxyError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"}))).into_response()
            }
            ProxyError::InvalidInput(message) => {
                json_error(StatusCode::BAD_REQUEST, "Invalid input", message)
            }
            other => {
                tracing::error!(error = %other, "Request failed");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error",
                    other.to_string(),
                )
            }
        }
    }
}

fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            ProxyError::InvalidJson("eof".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ProxyError::InvalidInput("missing field".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn setup_errors_map_to_500() {
        let err = ProxyError::Config("no webhook".into());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
