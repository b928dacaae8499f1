//! Request body sent to the card issuer.

use crate::request::PaymentRequest;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Merchant code used when none is configured.
pub const DEFAULT_MERCHANT_CODE: &str = "*";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub invoice_number: String,
    /// UTC, ISO-8601 with a trailing `Z`.
    pub invoice_date: String,
    pub total_amount: f64,
}

/// Card issuing request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuePayload {
    pub merchant_code: String,
    pub total_amount: f64,
    /// `[hauler_name, payment_id]`
    pub user_defined_fields: Vec<String>,
    pub invoices: Vec<Invoice>,
}

impl IssuePayload {
    /// Build the single-invoice payload for `request`, dated `now`.
    pub fn for_request(request: &PaymentRequest, merchant_code: &str, now: DateTime<Utc>) -> Self {
        Self {
            merchant_code: merchant_code.to_string(),
            total_amount: request.amount,
            user_defined_fields: vec![request.hauler_name.clone(), request.payment_id.clone()],
            invoices: vec![Invoice {
                invoice_number: request.invoice_number.clone(),
                invoice_date: invoice_date(now),
                total_amount: request.amount,
            }],
        }
    }
}

fn invoice_date(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}
