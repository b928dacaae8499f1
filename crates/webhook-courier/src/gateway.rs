//! Single-attempt HTTP dispatch to the downstream webhook.
//!
//! The gateway never retries on its own; retry belongs to the scheduler.
//! Only the status-code class of a response is interpreted.

use crate::envelope::DeliveryEnvelope;
use crate::error::{CourierError, CourierResult};
use crate::job::DeliveryJob;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Outbound POST used for every delivery.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// POST `body` to `url` once, bounded by `timeout`.
    ///
    /// `Ok(())` means a 2xx answer; anything else is an error.
    async fn post(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> CourierResult<()>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> CourierResult<()> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CourierError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Stateless sender bound to one webhook URL.
#[derive(Clone)]
pub struct DispatchGateway {
    transport: Arc<dyn WebhookTransport>,
    webhook_url: String,
    post_timeout: Duration,
}

impl DispatchGateway {
    pub fn new(
        transport: Arc<dyn WebhookTransport>,
        webhook_url: impl Into<String>,
        post_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            webhook_url: webhook_url.into(),
            post_timeout,
        }
    }

    /// Send the current attempt of a success delivery, stamped.
    pub async fn send_attempt<P: Serialize>(&self, job: &DeliveryJob<P>) -> CourierResult<()> {
        let body = job.stamped().to_json()?;
        debug!(
            url = %self.webhook_url,
            delivery_id = %job.delivery_id(),
            attempt = job.attempt(),
            "Sending delivery attempt"
        );
        self.send(&body).await
    }

    /// Send an error outcome once, without a stamp.
    pub async fn send_unstamped<P: Serialize>(&self, outcome: &P) -> CourierResult<()> {
        let body = DeliveryEnvelope::unstamped(outcome).to_json()?;
        debug!(url = %self.webhook_url, "Sending error delivery");
        self.send(&body).await
    }

    async fn send(&self, body: &serde_json::Value) -> CourierResult<()> {
        self.transport
            .post(&self.webhook_url, body, self.post_timeout)
            .await
    }
}

impl std::fmt::Debug for DispatchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchGateway")
            .field("webhook_url", &self.webhook_url)
            .field("post_timeout", &self.post_timeout)
            .finish_non_exhaustive()
    }
}
