//! Card issuer clients: the live HTTP API and a simulated one for test mode.

use crate::error::{IssuerError, IssuerResult};
use crate::payload::IssuePayload;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Default timeout for one issuing call.
pub const DEFAULT_ISSUER_TIMEOUT: Duration = Duration::from_secs(30);

/// Message prefix the issuer uses for approved requests.
pub const SUCCESS_PREFIX: &str = "Success:";

/// Raw issuer answer: status code and JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuerResponse {
    pub status: u16,
    pub body: Value,
}

/// Anything that can issue a virtual card.
#[async_trait]
pub trait CardIssuer: Send + Sync {
    /// Make one issuing call. Transport failures and non-JSON bodies are
    /// errors; any HTTP status is a response.
    async fn issue(&self, payload: &IssuePayload) -> IssuerResult<IssuerResponse>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Live issuer credentials.
#[derive(Clone)]
pub struct IssuerCredentials {
    pub api_url: String,
    pub username: String,
    pub password: String,
}

impl IssuerCredentials {
    /// `Authorization` header value.
    fn basic_auth(&self) -> String {
        let encoded = BASE64.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {encoded}")
    }
}

impl std::fmt::Debug for IssuerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerCredentials")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client for the live issuing API.
#[derive(Debug, Clone)]
pub struct HttpCardIssuer {
    client: Client,
    api_url: String,
    authorization: String,
}

impl HttpCardIssuer {
    pub fn new(credentials: &IssuerCredentials, timeout: Duration) -> IssuerResult<Self> {
        let url = Url::parse(&credentials.api_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(IssuerError::Config(format!(
                "issuer API URL must be http or https, got {}",
                url.scheme()
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: credentials.api_url.clone(),
            authorization: credentials.basic_auth(),
        })
    }
}

#[async_trait]
impl CardIssuer for HttpCardIssuer {
    async fn issue(&self, payload: &IssuePayload) -> IssuerResult<IssuerResponse> {
        info!(url = %self.api_url, "Calling card issuer");

        let response = self
            .client
            .post(&self.api_url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("Authorization", &self.authorization)
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body: Value = response.json().await?;
        debug!(status = status, "Card issuer responded");

        Ok(IssuerResponse { status, body })
    }

    fn name(&self) -> &'static str {
        "live"
    }
}

/// Test-mode issuer: approves everything with a fixed card, no network.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedCardIssuer;

impl SimulatedCardIssuer {
    pub const CARD_NUMBER: &'static str = "4111222233334444";
    pub const SECURITY_CODE: &'static str = "123";
    pub const EXPIRATION: &'static str = "2027-09-01T00:00:00Z";
    pub const MESSAGE: &'static str = "Success: Test mode transaction";
}

#[async_trait]
impl CardIssuer for SimulatedCardIssuer {
    async fn issue(&self, payload: &IssuePayload) -> IssuerResult<IssuerResponse> {
        info!(total_amount = payload.total_amount, "Test mode, simulating card issuer");
        Ok(IssuerResponse {
            status: 200,
            body: json!({
                "virtual_card": {
                    "number": Self::CARD_NUMBER,
                    "security_code": Self::SECURITY_CODE,
                    "expiration": Self::EXPIRATION,
                },
                "detailed_response_message": Self::MESSAGE,
            }),
        })
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> IssuerCredentials {
        IssuerCredentials {
            api_url: "https://issuer.example.com/cards".to_string(),
            username: "merchant".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn basic_auth_encodes_username_and_password() {
        assert_eq!(credentials().basic_auth(), "Basic bWVyY2hhbnQ6aHVudGVyMg==");
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("merchant"));
    }

    #[test]
    fn rejects_non_http_api_url() {
        let mut credentials = credentials();
        credentials.api_url = "ftp://issuer.example.com".to_string();
        assert!(matches!(
            HttpCardIssuer::new(&credentials, DEFAULT_ISSUER_TIMEOUT),
            Err(IssuerError::Config(_))
        ));

        credentials.api_url = "issuer".to_string();
        assert!(matches!(
            HttpCardIssuer::new(&credentials, DEFAULT_ISSUER_TIMEOUT),
            Err(IssuerError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn simulated_issuer_approves_with_fixed_card() {
        let payload = IssuePayload {
            merchant_code: "*".to_string(),
            total_amount: 10.0,
            user_defined_fields: vec!["Hauler".to_string(), "PAY-1".to_string()],
            invoices: Vec::new(),
        };

        let response = SimulatedCardIssuer.issue(&payload).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body["virtual_card"]["number"], "4111222233334444");
        assert_eq!(response.body["virtual_card"]["expiration"], "2027-09-01T00:00:00Z");
        assert!(response.body["detailed_response_message"]
            .as_str()
            .unwrap()
            .starts_with(SUCCESS_PREFIX));
    }
}
