//! Failed upstream outcomes bypass the scheduler.

use super::harness::{build, scenario_config, Reply};
use serde_json::json;
use std::time::Duration;

fn failure_outcome() -> serde_json::Value {
    json!({
        "_model": "x_requests",
        "_id": "P-300",
        "status": 402,
        "error": "Insufficient funds",
    })
}

#[tokio::test(start_paused = true)]
async fn error_outcome_is_sent_once_without_stamp() {
    let (courier, transport) = build(scenario_config());

    let delivered = courier.on_upstream_error(&failure_outcome()).await;

    assert!(delivered);
    tokio::time::sleep(Duration::from_secs(60)).await;
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, failure_outcome(), "body goes out verbatim");
    assert!(sent[0].delivery_id().is_none());
    assert!(sent[0].attempt().is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_error_delivery_is_not_retried() {
    let (courier, transport) = build(scenario_config());
    transport.queue_reply(Reply::Status(500));

    let delivered = courier.on_upstream_error(&failure_outcome()).await;

    assert!(!delivered);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.sent_count(), 1);

    let stats = courier.stats();
    assert_eq!(stats.error_deliveries, 1);
    assert_eq!(stats.send_failures, 1);
    assert_eq!(stats.started, 0);
}

#[tokio::test(start_paused = true)]
async fn acks_do_not_affect_error_deliveries() {
    let (courier, transport) = build(scenario_config());
    courier.on_ack("P-300");

    courier.on_upstream_error(&failure_outcome()).await;
    courier.on_ack("P-300");

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.sent_count(), 1);
    let status = transport.sent()[0].body["status"].as_u64().unwrap();
    assert!((400..600).contains(&status));
}
