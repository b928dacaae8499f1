//! Virtual card issuing for payment requests.
//!
//! This crate provides:
//! - PaymentRequest: validated inbound request fields
//! - IssuePayload: the body sent to the issuer
//! - CardIssuer: the live HTTP issuer and a simulated one for test mode
//! - evaluate: maps an issuer response to a CardOutcome or FailureOutcome

mod client;
mod error;
mod outcome;
mod payload;
mod request;

pub use client::{
    CardIssuer, HttpCardIssuer, IssuerCredentials, IssuerResponse, SimulatedCardIssuer,
    DEFAULT_ISSUER_TIMEOUT, SUCCESS_PREFIX,
};
pub use error::{IssuerError, IssuerResult};
pub use outcome::{evaluate, CardOutcome, FailureOutcome, IssueOutcome, BAD_GATEWAY, OUTCOME_MODEL};
pub use payload::{Invoice, IssuePayload, DEFAULT_MERCHANT_CODE};
pub use request::{PaymentRequest, AUTH_TOKEN_FIELD};
