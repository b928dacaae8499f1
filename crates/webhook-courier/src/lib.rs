//! Webhook courier: at-least-once delivery of outcome events over HTTP.
//!
//! Every successful upstream outcome becomes a delivery job that POSTs the
//! outcome to a downstream webhook until the consumer ACKs it or attempts
//! run out. Failed upstream outcomes are sent once and forgotten.
//!
//! # Core Invariants
//!
//! 1. **Stable Identity**: every attempt of one outcome carries the same
//!    `_delivery_id`; `_delivery_attempt` runs 1, 2, .. without gaps
//! 2. **ACK-Gated**: an ACK recorded after any send stops the job before
//!    its next send
//! 3. **Bounded**: without an ACK exactly `max_attempts` sends happen,
//!    spaced by the ACK window plus `base * 2^(attempt - 1)`
//! 4. **Non-Blocking**: starting a job never waits on network I/O; send
//!    failures never reach the caller
//! 5. **Memory-Only**: jobs die with the process; ACKs are never forgotten
//!    while it runs
//!
//! # Architecture
//!
//! ```text
//! on_upstream_success -> Scheduler --(stamped POST)--> Downstream
//!                          |    ^                          |
//!                          |    |___ AckRegistry <___ on_ack
//!                          v
//!                      backoff / exhaust
//!
//! on_upstream_error ----------------(one POST)-------> Downstream
//! ```

pub mod ack_registry;
pub mod backoff;
pub mod config;
pub mod courier;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod job;
pub mod scheduler;
pub mod stats;

#[cfg(test)]
mod tests;

pub use ack_registry::{AckReceipt, AckRegistry};
pub use backoff::BackoffPolicy;
pub use config::DeliveryConfig;
pub use courier::Courier;
pub use envelope::{DeliveryEnvelope, DELIVERY_ATTEMPT_FIELD, DELIVERY_ID_FIELD};
pub use error::{CourierError, CourierResult};
pub use gateway::{DispatchGateway, HttpTransport, WebhookTransport};
pub use job::{DeliveryId, DeliveryJob, DeliveryState};
pub use scheduler::{DeliveryHandle, DeliveryOutcome, DeliveryScheduler};
pub use stats::{DeliveryStats, StatsSnapshot};
