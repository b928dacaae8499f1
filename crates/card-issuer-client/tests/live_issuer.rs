//! HttpCardIssuer against a local stand-in for the issuing API.

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use card_issuer_client::{
    evaluate, CardIssuer, HttpCardIssuer, IssueOutcome, IssuePayload, IssuerCredentials,
    IssuerError, PaymentRequest,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;

async fn approve(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    (
        StatusCode::OK,
        Json(json!({
            "virtual_card": {
                "number": "5555444433332222",
                "security_code": "987",
                "expiration": "2028-03-01T00:00:00Z"
            },
            "detailed_response_message": "Success: issued",
            "echo_auth": auth,
            "echo_body": body,
        })),
    )
}

async fn decline() -> (StatusCode, Json<Value>) {
    (
        StatusCode::PAYMENT_REQUIRED,
        Json(json!({"detailed_response_message": "Declined: over limit"})),
    )
}

async fn not_json() -> (StatusCode, &'static str) {
    (StatusCode::OK, "<html>maintenance</html>")
}

async fn spawn_issuer() -> String {
    let app = Router::new()
        .route("/approve", post(approve))
        .route("/decline", post(decline))
        .route("/html", post(not_json));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn issuer(url: String) -> HttpCardIssuer {
    let credentials = IssuerCredentials {
        api_url: url,
        username: "merchant".to_string(),
        password: "hunter2".to_string(),
    };
    HttpCardIssuer::new(&credentials, Duration::from_secs(5)).unwrap()
}

fn request() -> PaymentRequest {
    PaymentRequest::from_json(json!({
        "_id": 5,
        "x_name": "PAY-5",
        "x_studio_vendor_name": "Acme Hauling",
        "x_studio_vendor_payment_amount_requested": "250",
        "x_studio_hauler_invoice_or_remittance_advice_memo": "INV-5"
    }))
    .unwrap()
}

#[tokio::test]
async fn live_call_sends_basic_auth_and_payload() {
    let base = spawn_issuer().await;
    let request = request();
    let payload = IssuePayload::for_request(&request, "M-1", Utc::now());

    let response = issuer(format!("{base}/approve"))
        .issue(&payload)
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body["echo_auth"], "Basic bWVyY2hhbnQ6aHVudGVyMg==");
    assert_eq!(response.body["echo_body"]["merchant_code"], "M-1");
    assert_eq!(response.body["echo_body"]["total_amount"], 250.0);

    let IssueOutcome::Approved(card) = evaluate(&request, &response) else {
        panic!("expected approval");
    };
    assert_eq!(card.card_number, json!("5555444433332222"));
    assert_eq!(card.expiration_year, "2028");
    assert_eq!(card.expiration_month, "03");
    assert_eq!(card.amount, "250.00");
}

#[tokio::test]
async fn error_status_is_a_response_not_an_error() {
    let base = spawn_issuer().await;
    let request = request();
    let payload = IssuePayload::for_request(&request, "*", Utc::now());

    let response = issuer(format!("{base}/decline")).issue(&payload).await.unwrap();

    assert_eq!(response.status, 402);
    assert!(matches!(
        evaluate(&request, &response),
        IssueOutcome::Declined(ref f) if f.status == 402 && f.error == json!("Declined: over limit")
    ));
}

#[tokio::test]
async fn non_json_body_is_an_error() {
    let base = spawn_issuer().await;
    let payload = IssuePayload::for_request(&request(), "*", Utc::now());

    let err = issuer(format!("{base}/html")).issue(&payload).await.unwrap_err();

    assert!(matches!(err, IssuerError::Http(_)), "{err}");
}

#[tokio::test]
async fn unreachable_issuer_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let payload = IssuePayload::for_request(&request(), "*", Utc::now());

    let err = issuer(format!("http://{addr}/cards")).issue(&payload).await.unwrap_err();

    assert!(matches!(err, IssuerError::Http(_)), "{err}");
}
