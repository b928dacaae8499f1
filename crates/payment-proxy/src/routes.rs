//! HTTP handlers.

use crate::error::{ProxyError, ProxyResult};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use card_issuer_client::{
    evaluate, FailureOutcome, IssueOutcome, IssuePayload, PaymentRequest, AUTH_TOKEN_FIELD,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Response header carrying the delivery identifier of a success outcome.
pub const DELIVERY_ID_HEADER: &str = "x-delivery-id";

/// `POST /proxy`: issue a card and hand the outcome to the courier.
pub async fn proxy(State(state): State<AppState>, body: Bytes) -> ProxyResult<Response> {
    let body = parse_object(&body)?;
    check_auth(&state, &body)?;
    let request = PaymentRequest::from_json(Value::Object(body))
        .map_err(|e| ProxyError::InvalidInput(e.to_string()))?;

    let span = info_span!("proxy", payment_id = %request.payment_id);
    Ok(issue(state, request).instrument(span).await)
}

async fn issue(state: AppState, request: PaymentRequest) -> Response {
    debug!(
        hauler = %request.hauler_name,
        amount = request.amount,
        invoice = %request.invoice_number,
        "Payment request accepted"
    );
    let payload = IssuePayload::for_request(&request, state.merchant_code(), Utc::now());

    let response = match state.issuer().issue(&payload).await {
        Ok(response) => response,
        Err(e) => {
            error!(issuer = state.issuer().name(), error = %e, "Card issuer request failed");
            let failure = FailureOutcome::unreachable(&request, &e);
            return deliver_failure(&state, failure);
        }
    };

    match evaluate(&request, &response) {
        IssueOutcome::Declined(failure) => deliver_failure(&state, failure),
        IssueOutcome::Approved(card) => {
            let handle = state
                .courier()
                .on_upstream_success(card.clone(), request.payment_id.clone());
            let delivery_id = handle.detach();
            info!(delivery_id = %delivery_id, "Card issued, delivery started");

            let mut response = (StatusCode::OK, Json(card)).into_response();
            if let Ok(value) = HeaderValue::from_str(&delivery_id.to_string()) {
                response.headers_mut().insert(DELIVERY_ID_HEADER, value);
            }
            response
        }
    }
}

/// The one-shot failure send runs in its own task; the caller's answer never
/// waits on the webhook.
fn deliver_failure(state: &AppState, failure: FailureOutcome) -> Response {
    let courier = state.courier().clone();
    let outcome = failure.clone();
    tokio::spawn(
        async move {
            if !courier.on_upstream_error(&outcome).await {
                error!(status = outcome.status, "Failure outcome was not delivered downstream");
            }
        }
        .in_current_span(),
    );

    let status = StatusCode::from_u16(failure.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(failure)).into_response()
}

/// `POST /ack`: the consumer durably processed a success delivery.
pub async fn ack(State(state): State<AppState>, body: Bytes) -> ProxyResult<Json<Value>> {
    let body = parse_object(&body)?;
    check_auth(&state, &body)?;

    let payment_id = body
        .get("payment_id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ProxyError::InvalidInput("payment_id is required".to_string()))?;

    let receipt = state.courier().on_ack(payment_id);
    Ok(Json(json!({
        "status": "acknowledged",
        "payment_id": payment_id,
        "first_ack": receipt.first,
    })))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "deliveries": state.courier().stats(),
    }))
}

fn parse_object(body: &[u8]) -> ProxyResult<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(ProxyError::InvalidJson(
            "request body must be a JSON object".to_string(),
        )),
        Err(e) => {
            warn!(error = %e, "Rejected request with invalid JSON");
            Err(ProxyError::InvalidJson(e.to_string()))
        }
    }
}

fn check_auth(state: &AppState, body: &Map<String, Value>) -> ProxyResult<()> {
    let presented = body.get(AUTH_TOKEN_FIELD).and_then(Value::as_str);
    if state.authorized(presented) {
        Ok(())
    } else {
        warn!("Unauthorized access attempt");
        Err(ProxyError::Unauthorized)
    }
}
