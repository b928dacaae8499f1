//! Mapping an issuer response to the outcome forwarded downstream.
//!
//! An approval needs both a 2xx status and a message starting with
//! `"Success:"`. Everything else, including an approval without a usable
//! `virtual_card`, is a failure.

use crate::client::{IssuerResponse, SUCCESS_PREFIX};
use crate::error::IssuerError;
use crate::request::PaymentRequest;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Record model both outcomes are tagged with.
pub const OUTCOME_MODEL: &str = "x_requests";

/// Status used when the issuer could not be reached or its answer was
/// unusable.
pub const BAD_GATEWAY: u16 = 502;

/// An issued virtual card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardOutcome {
    #[serde(rename = "_model")]
    pub model: &'static str,
    #[serde(rename = "_id")]
    pub request_id: Value,
    pub status: u16,
    pub card_number: Value,
    /// `MM`, from the card's expiration date.
    pub expiration_month: String,
    /// `YYYY`, from the card's expiration date.
    pub expiration_year: String,
    pub security_code: Value,
    pub payment_id: String,
    /// Two decimals.
    pub amount: String,
    pub hauler_name: String,
    pub employee: Value,
    pub invoice_number: String,
}

/// A declined or failed issuing call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureOutcome {
    #[serde(rename = "_model")]
    pub model: &'static str,
    #[serde(rename = "_id")]
    pub request_id: Value,
    /// Always a 4xx or 5xx code.
    pub status: u16,
    /// The issuer's message, or its whole body when the message is empty.
    pub error: Value,
}

impl FailureOutcome {
    fn new(request: &PaymentRequest, status: u16, error: Value) -> Self {
        Self {
            model: OUTCOME_MODEL,
            request_id: request.request_id.clone(),
            status: error_status(status),
            error,
        }
    }

    /// The issuer could not be called at all.
    pub fn unreachable(request: &PaymentRequest, err: &IssuerError) -> Self {
        Self::new(
            request,
            BAD_GATEWAY,
            Value::String(format!("Card issuer request failed: {err}")),
        )
    }
}

/// Result of evaluating one issuer response.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueOutcome {
    Approved(CardOutcome),
    Declined(FailureOutcome),
}

/// Evaluate `response` to the call made for `request`.
pub fn evaluate(request: &PaymentRequest, response: &IssuerResponse) -> IssueOutcome {
    let message = response
        .body
        .get("detailed_response_message")
        .and_then(Value::as_str)
        .unwrap_or("");
    let approved = (200..300).contains(&response.status) && message.starts_with(SUCCESS_PREFIX);

    if !approved {
        warn!(status = response.status, message = %message, "Card issuer declined");
        let error = if message.is_empty() {
            response.body.clone()
        } else {
            Value::String(message.to_string())
        };
        return IssueOutcome::Declined(FailureOutcome::new(request, response.status, error));
    }

    match card_outcome(request, response) {
        Ok(card) => IssueOutcome::Approved(card),
        Err(reason) => {
            warn!(reason = %reason, "Approved response without a usable virtual card");
            IssueOutcome::Declined(FailureOutcome::new(
                request,
                BAD_GATEWAY,
                Value::String(format!("Malformed virtual card: {reason}")),
            ))
        }
    }
}

fn card_outcome(request: &PaymentRequest, response: &IssuerResponse) -> Result<CardOutcome, String> {
    let card = response
        .body
        .get("virtual_card")
        .filter(|v| v.is_object())
        .ok_or("missing virtual_card")?;
    let expiration = card
        .get("expiration")
        .and_then(Value::as_str)
        .ok_or("missing expiration")?;
    let (year, month) = expiration_parts(expiration)
        .ok_or_else(|| format!("unparseable expiration {expiration:?}"))?;

    Ok(CardOutcome {
        model: OUTCOME_MODEL,
        request_id: request.request_id.clone(),
        status: response.status,
        card_number: card.get("number").cloned().unwrap_or(Value::Null),
        expiration_month: month.to_string(),
        expiration_year: year.to_string(),
        security_code: card.get("security_code").cloned().unwrap_or(Value::Null),
        payment_id: request.payment_id.clone(),
        amount: request.formatted_amount(),
        hauler_name: request.hauler_name.clone(),
        employee: request.employee.clone(),
        invoice_number: request.invoice_number.clone(),
    })
}

/// `("2027", "09")` from `"2027-09-01T00:00:00Z"`.
fn expiration_parts(expiration: &str) -> Option<(&str, &str)> {
    let date = expiration.split('T').next()?;
    let mut parts = date.split('-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    (numeric(year) && numeric(month) && numeric(day)).then_some((year, month))
}

fn error_status(status: u16) -> u16 {
    if (400..600).contains(&status) {
        status
    } else {
        BAD_GATEWAY
    }
}
