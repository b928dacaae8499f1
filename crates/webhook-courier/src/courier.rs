//! Entry points used by the request-handling layer.

use crate::ack_registry::{AckReceipt, AckRegistry};
use crate::config::DeliveryConfig;
use crate::error::CourierResult;
use crate::gateway::{DispatchGateway, HttpTransport, WebhookTransport};
use crate::scheduler::{DeliveryHandle, DeliveryScheduler};
use crate::stats::{DeliveryStats, StatsSnapshot};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// The webhook courier.
///
/// Cheap to clone; clones share the registry and counters.
#[derive(Debug, Clone)]
pub struct Courier {
    gateway: DispatchGateway,
    registry: Arc<AckRegistry>,
    stats: Arc<DeliveryStats>,
    scheduler: DeliveryScheduler,
}

impl Courier {
    /// Create a courier posting over HTTP.
    pub fn new(config: DeliveryConfig) -> CourierResult<Self> {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    /// Create a courier with a custom transport.
    pub fn with_transport(
        config: DeliveryConfig,
        transport: Arc<dyn WebhookTransport>,
    ) -> CourierResult<Self> {
        config.validate()?;

        let config = Arc::new(config);
        let gateway = DispatchGateway::new(transport, &config.webhook_url, config.post_timeout);
        let registry = Arc::new(AckRegistry::new());
        let stats = Arc::new(DeliveryStats::new());
        let scheduler = DeliveryScheduler::new(
            gateway.clone(),
            registry.clone(),
            config.clone(),
            stats.clone(),
        );

        info!(
            webhook_url = %config.webhook_url,
            max_attempts = config.max_attempts,
            ack_timeout_ms = config.ack_timeout.as_millis() as u64,
            backoff_base_ms = config.backoff.base.as_millis() as u64,
            "Courier configured"
        );

        Ok(Self {
            gateway,
            registry,
            stats,
            scheduler,
        })
    }

    /// A successful upstream outcome: deliver it until ACKed or exhausted.
    ///
    /// Returns immediately. `business_id` is the key the consumer will ACK
    /// with.
    pub fn on_upstream_success<P>(&self, payload: P, business_id: impl Into<String>) -> DeliveryHandle
    where
        P: Serialize + Send + Sync + 'static,
    {
        self.scheduler.start(payload, business_id)
    }

    /// A failed upstream outcome: send it once, unstamped, never retried.
    ///
    /// Returns whether the downstream accepted it. Failure is logged, not
    /// raised.
    pub async fn on_upstream_error<P: Serialize>(&self, payload: &P) -> bool {
        self.stats.error_delivered();
        match self.gateway.send_unstamped(payload).await {
            Ok(()) => {
                info!("Error outcome delivered");
                true
            }
            Err(e) => {
                self.stats.send_failed();
                warn!(error = %e, "Error outcome delivery failed, not retrying");
                false
            }
        }
    }

    /// Consumer acknowledgement for `business_id`. Never fails.
    pub fn on_ack(&self, business_id: &str) -> AckReceipt {
        self.registry.record(business_id)
    }

    pub fn registry(&self) -> &Arc<AckRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
