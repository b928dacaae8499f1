//! Wire-level delivery body.
//!
//! A success delivery is the outcome object with two extra top-level
//! fields:
//!
//! ```json
//! { ...outcome fields..., "_delivery_id": "<uuid>", "_delivery_attempt": 2 }
//! ```
//!
//! Error deliveries carry the outcome object unchanged. The outcome must
//! serialize as a JSON object (a struct or a map); the delivery fields
//! are flattened alongside its own fields.

use crate::error::CourierResult;
use crate::job::DeliveryId;
use serde::Serialize;

/// Field carrying the idempotency identifier.
pub const DELIVERY_ID_FIELD: &str = "_delivery_id";

/// Field carrying the 1-based attempt counter.
pub const DELIVERY_ATTEMPT_FIELD: &str = "_delivery_attempt";

/// An outcome plus its optional delivery stamp.
#[derive(Debug, Serialize)]
pub struct DeliveryEnvelope<'a, P> {
    #[serde(flatten)]
    outcome: &'a P,
    #[serde(rename = "_delivery_id", skip_serializing_if = "Option::is_none")]
    delivery_id: Option<DeliveryId>,
    #[serde(rename = "_delivery_attempt", skip_serializing_if = "Option::is_none")]
    delivery_attempt: Option<u32>,
}

impl<'a, P> DeliveryEnvelope<'a, P> {
    /// Body for one attempt of a success delivery.
    pub fn stamped(outcome: &'a P, delivery_id: DeliveryId, attempt: u32) -> Self {
        Self {
            outcome,
            delivery_id: Some(delivery_id),
            delivery_attempt: Some(attempt),
        }
    }

    /// Body for a one-shot error delivery.
    pub fn unstamped(outcome: &'a P) -> Self {
        Self {
            outcome,
            delivery_id: None,
            delivery_attempt: None,
        }
    }

    pub fn delivery_id(&self) -> Option<DeliveryId> {
        self.delivery_id
    }

    pub fn delivery_attempt(&self) -> Option<u32> {
        self.delivery_attempt
    }
}

impl<P: Serialize> DeliveryEnvelope<'_, P> {
    /// Encode to a JSON value for the transport.
    pub fn to_json(&self) -> CourierResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
