//! The unit of retryable delivery work.

use crate::envelope::DeliveryEnvelope;
use crate::error::{CourierError, CourierResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier stamped on every attempt of one success outcome.
///
/// Downstream consumers de-duplicate on this value; it never changes
/// between attempts of the same job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(Uuid);

impl DeliveryId {
    /// Allocate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeliveryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a delivery job.
///
/// ```text
/// pending -> awaiting_ack -> acked
///    ^            |
///    |____________+-------> exhausted
/// ```
///
/// A job stays in `awaiting_ack` through the backoff sleep, so an ACK
/// landing between attempts still ends it before the next send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    /// Created or between attempts; the next send has not happened yet.
    Pending,
    /// An attempt was sent and the job is watching for an ACK.
    AwaitingAck,
    /// The consumer acknowledged. Terminal.
    Acked,
    /// `max_attempts` were sent without an ACK. Terminal.
    Exhausted,
}

impl DeliveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Pending => "pending",
            DeliveryState::AwaitingAck => "awaiting_ack",
            DeliveryState::Acked => "acked",
            DeliveryState::Exhausted => "exhausted",
        }
    }

    /// Whether no further sends can happen from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryState::Acked | DeliveryState::Exhausted)
    }

    fn can_transition_to(&self, next: DeliveryState) -> bool {
        matches!(
            (self, next),
            (DeliveryState::Pending, DeliveryState::AwaitingAck)
                | (DeliveryState::AwaitingAck, DeliveryState::Pending)
                | (DeliveryState::AwaitingAck, DeliveryState::Acked)
                | (DeliveryState::AwaitingAck, DeliveryState::Exhausted)
        )
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One success outcome being delivered.
///
/// Owned exclusively by the task driving it. The payload is immutable
/// after creation; only `attempt` and `state` move, and only forward.
#[derive(Debug)]
pub struct DeliveryJob<P> {
    delivery_id: DeliveryId,
    business_id: String,
    payload: Arc<P>,
    attempt: u32,
    max_attempts: u32,
    state: DeliveryState,
}

impl<P> DeliveryJob<P> {
    /// Create a job in `pending` with attempt 1.
    ///
    /// `max_attempts` below 1 is raised to 1.
    pub fn new(payload: P, business_id: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            delivery_id: DeliveryId::new(),
            business_id: business_id.into(),
            payload: Arc::new(payload),
            attempt: 1,
            max_attempts: max_attempts.max(1),
            state: DeliveryState::Pending,
        }
    }

    pub fn delivery_id(&self) -> DeliveryId {
        self.delivery_id
    }

    pub fn business_id(&self) -> &str {
        &self.business_id
    }

    /// Current attempt number (1-based).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn state(&self) -> DeliveryState {
        self.state
    }

    /// Whether the current attempt is the last one allowed.
    pub fn is_last_attempt(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// The wire body for the current attempt.
    pub fn stamped(&self) -> DeliveryEnvelope<'_, P> {
        DeliveryEnvelope::stamped(&self.payload, self.delivery_id, self.attempt)
    }

    /// The current attempt was sent; start watching for an ACK.
    pub fn mark_awaiting_ack(&mut self) -> CourierResult<()> {
        self.transition(DeliveryState::AwaitingAck)
    }

    /// An ACK was observed. Terminal.
    pub fn mark_acked(&mut self) -> CourierResult<()> {
        self.transition(DeliveryState::Acked)
    }

    /// The last attempt's ACK window closed empty. Terminal.
    pub fn mark_exhausted(&mut self) -> CourierResult<()> {
        if !self.is_last_attempt() {
            return Err(CourierError::InvalidTransition {
                from: self.state,
                to: DeliveryState::Exhausted,
            });
        }
        self.transition(DeliveryState::Exhausted)
    }

    /// Move to the next attempt after the backoff sleep.
    pub fn advance(&mut self) -> CourierResult<()> {
        if self.is_last_attempt() {
            return Err(CourierError::InvalidTransition {
                from: self.state,
                to: DeliveryState::Pending,
            });
        }
        self.transition(DeliveryState::Pending)?;
        self.attempt += 1;
        Ok(())
    }

    fn transition(&mut self, next: DeliveryState) -> CourierResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(CourierError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
