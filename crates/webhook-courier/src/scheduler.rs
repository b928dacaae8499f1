//! Drives one delivery job from creation to a terminal state.
//!
//! Every job runs on its own task. The only suspension points are the ACK
//! wait after each send and the backoff sleep before the next one; both
//! observe the ACK registry, so an ACK recorded at any point after a send
//! stops the job before it sends again.

use crate::ack_registry::AckRegistry;
use crate::config::DeliveryConfig;
use crate::error::CourierResult;
use crate::gateway::DispatchGateway;
use crate::job::{DeliveryId, DeliveryJob, DeliveryState};
use crate::stats::DeliveryStats;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

/// Final report of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub delivery_id: DeliveryId,
    pub business_id: String,
    /// `acked` or `exhausted`.
    pub state: DeliveryState,
    /// Attempts actually sent.
    pub attempts: u32,
}

/// Handle to a running job.
///
/// Dropping the handle does not stop the job.
#[derive(Debug)]
pub struct DeliveryHandle {
    delivery_id: DeliveryId,
    task: JoinHandle<DeliveryOutcome>,
}

impl DeliveryHandle {
    pub fn delivery_id(&self) -> DeliveryId {
        self.delivery_id
    }

    /// Wait for the job to end.
    ///
    /// `None` if the task was aborted or panicked, e.g. at runtime shutdown.
    pub async fn outcome(self) -> Option<DeliveryOutcome> {
        self.task.await.ok()
    }

    /// Let the job run unobserved.
    pub fn detach(self) -> DeliveryId {
        self.delivery_id
    }
}

/// Spawns and runs delivery jobs.
#[derive(Debug, Clone)]
pub struct DeliveryScheduler {
    gateway: DispatchGateway,
    registry: Arc<AckRegistry>,
    config: Arc<DeliveryConfig>,
    stats: Arc<DeliveryStats>,
}

impl DeliveryScheduler {
    pub fn new(
        gateway: DispatchGateway,
        registry: Arc<AckRegistry>,
        config: Arc<DeliveryConfig>,
        stats: Arc<DeliveryStats>,
    ) -> Self {
        Self {
            gateway,
            registry,
            config,
            stats,
        }
    }

    /// Create a job for `payload` and start delivering it in the background.
    ///
    /// Returns without waiting on any I/O. Must be called within a Tokio
    /// runtime.
    pub fn start<P>(&self, payload: P, business_id: impl Into<String>) -> DeliveryHandle
    where
        P: Serialize + Send + Sync + 'static,
    {
        let job = DeliveryJob::new(payload, business_id, self.config.max_attempts);
        let delivery_id = job.delivery_id();
        let span = info_span!(
            "delivery",
            delivery_id = %delivery_id,
            business_id = %job.business_id()
        );

        self.stats.job_started();
        info!(
            parent: &span,
            max_attempts = job.max_attempts(),
            "Delivery job started"
        );

        let runner = self.clone();
        let task = tokio::spawn(async move { runner.run(job).await }.instrument(span));

        DeliveryHandle { delivery_id, task }
    }

    async fn run<P: Serialize>(&self, mut job: DeliveryJob<P>) -> DeliveryOutcome {
        if let Err(e) = self.drive(&mut job).await {
            error!(error = %e, state = %job.state(), "Delivery job aborted");
        }

        match job.state() {
            DeliveryState::Acked => self.stats.job_acked(),
            _ => self.stats.job_exhausted(),
        }

        DeliveryOutcome {
            delivery_id: job.delivery_id(),
            business_id: job.business_id().to_string(),
            state: job.state(),
            attempts: job.attempt(),
        }
    }

    async fn drive<P: Serialize>(&self, job: &mut DeliveryJob<P>) -> CourierResult<()> {
        let poll = self.config.effective_poll_interval();

        loop {
            self.stats.attempt_sent();
            if let Err(e) = self.gateway.send_attempt(job).await {
                self.stats.send_failed();
                warn!(
                    attempt = job.attempt(),
                    error = %e,
                    "Delivery attempt failed, treating as no ACK"
                );
            }
            job.mark_awaiting_ack()?;

            let ack_deadline = deadline_after(self.config.ack_timeout);
            if self
                .registry
                .wait_until(job.business_id(), ack_deadline, poll)
                .await
            {
                job.mark_acked()?;
                info!(attempt = job.attempt(), "Delivery acknowledged");
                return Ok(());
            }

            if job.is_last_attempt() {
                job.mark_exhausted()?;
                warn!(
                    attempts = job.attempt(),
                    "Delivery exhausted without ACK"
                );
                return Ok(());
            }

            let backoff = self.config.backoff.wait(job.attempt());
            info!(
                attempt = job.attempt(),
                backoff_ms = backoff.as_millis() as u64,
                "No ACK, backing off"
            );
            let wake = deadline_after(backoff);
            if self.registry.wait_until(job.business_id(), wake, poll).await {
                job.mark_acked()?;
                info!(attempt = job.attempt(), "Delivery acknowledged during backoff");
                return Ok(());
            }

            job.advance()?;
        }
    }
}

/// `now + wait`, clamped to roughly 30 years out for saturated backoffs.
fn deadline_after(wait: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(wait)
        .unwrap_or_else(|| now + Duration::from_secs(86400 * 365 * 30))
}
