//! Inbound payment request.

use crate::error::{IssuerError, IssuerResult};
use serde::Deserialize;
use serde_json::Value;

/// Body field carrying the caller's auth token.
pub const AUTH_TOKEN_FIELD: &str = "x_studio_proxy_auth_token";

/// Amount as sent by the caller: a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    fn to_f64(&self) -> IssuerResult<f64> {
        let value = match self {
            RawAmount::Number(n) => *n,
            RawAmount::Text(s) => s.trim().parse::<f64>().map_err(|e| {
                IssuerError::InvalidInput(format!("could not convert amount {s:?} to float: {e}"))
            })?,
        };
        if !value.is_finite() {
            return Err(IssuerError::InvalidInput(format!(
                "amount must be finite, got {value}"
            )));
        }
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    #[serde(rename = "_id", default)]
    underscore_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    x_name: String,
    x_studio_vendor_name: String,
    x_studio_vendor_payment_amount_requested: RawAmount,
    x_studio_hauler_invoice_or_remittance_advice_memo: String,
    #[serde(default)]
    x_studio_employee_name: Option<Value>,
}

/// A validated request for one virtual card.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// Caller's record id, echoed back as `_id`. `Null` when absent.
    pub request_id: Value,
    /// Business identifier; the key ACKs are sent with.
    pub payment_id: String,
    pub hauler_name: String,
    pub amount: f64,
    pub invoice_number: String,
    /// Passed through as sent. `Null` when absent.
    pub employee: Value,
}

impl PaymentRequest {
    /// Extract and validate the request fields from a parsed JSON body.
    ///
    /// `_id` wins over `id` unless it is absent or null.
    pub fn from_json(body: Value) -> IssuerResult<Self> {
        let raw: RawRequest =
            serde_json::from_value(body).map_err(|e| IssuerError::InvalidInput(e.to_string()))?;
        let amount = raw.x_studio_vendor_payment_amount_requested.to_f64()?;

        let request_id = raw
            .underscore_id
            .filter(|v| !v.is_null())
            .or(raw.id)
            .unwrap_or(Value::Null);

        Ok(Self {
            request_id,
            payment_id: raw.x_name,
            hauler_name: raw.x_studio_vendor_name,
            amount,
            invoice_number: raw.x_studio_hauler_invoice_or_remittance_advice_memo,
            employee: raw.x_studio_employee_name.unwrap_or(Value::Null),
        })
    }

    /// Amount as the caller sees it echoed back: two decimals.
    pub fn formatted_amount(&self) -> String {
        format!("{:.2}", self.amount)
    }
}
