//! Shared application state.

use crate::config::{IssuerMode, ProxyConfig};
use crate::error::ProxyResult;
use card_issuer_client::{CardIssuer, HttpCardIssuer, SimulatedCardIssuer};
use std::sync::Arc;
use webhook_courier::Courier;

/// State shared by every request handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    courier: Courier,
    issuer: Arc<dyn CardIssuer>,
    auth_token: Option<String>,
    merchant_code: String,
}

impl AppState {
    pub fn new(
        courier: Courier,
        issuer: Arc<dyn CardIssuer>,
        auth_token: Option<String>,
        merchant_code: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                courier,
                issuer,
                auth_token,
                merchant_code: merchant_code.into(),
            }),
        }
    }

    /// Build the production state: HTTP courier plus the configured issuer.
    pub fn from_config(config: &ProxyConfig) -> ProxyResult<Self> {
        let courier = Courier::new(config.delivery.clone())?;
        let issuer: Arc<dyn CardIssuer> = match &config.issuer {
            IssuerMode::Simulated => Arc::new(SimulatedCardIssuer),
            IssuerMode::Live {
                credentials,
                timeout,
            } => Arc::new(HttpCardIssuer::new(credentials, *timeout)?),
        };

        Ok(Self::new(
            courier,
            issuer,
            config.auth_token.clone(),
            config.merchant_code.clone(),
        ))
    }

    pub fn courier(&self) -> &Courier {
        &self.inner.courier
    }

    pub fn issuer(&self) -> &dyn CardIssuer {
        self.inner.issuer.as_ref()
    }

    pub fn merchant_code(&self) -> &str {
        &self.inner.merchant_code
    }

    /// Whether `presented` satisfies the configured token. Always true when
    /// no token is configured.
    pub fn authorized(&self, presented: Option<&str>) -> bool {
        match &self.inner.auth_token {
            Some(expected) => presented == Some(expected.as_str()),
            None => true,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("courier", &self.inner.courier)
            .field("issuer", &self.inner.issuer.name())
            .field("auth_required", &self.inner.auth_token.is_some())
            .field("merchant_code", &self.inner.merchant_code)
            .finish()
    }
}
