//! Thread-safe record of acknowledged business identifiers.
//!
//! Entries are never removed for the life of the process. Writers are the
//! inbound ACK handler; readers are in-flight delivery jobs. A write wakes
//! every job currently waiting, so ACK-to-stop latency does not depend on
//! the poll interval.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info};

/// Result of recording an ACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckReceipt {
    /// When the identifier was first acknowledged.
    pub acked_at: DateTime<Utc>,
    /// `false` when this call repeated an earlier ACK.
    pub first: bool,
}

/// Concurrent ACK store keyed by business identifier.
#[derive(Debug, Default)]
pub struct AckRegistry {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
    written: Notify,
}

impl AckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an ACK. Idempotent; never fails.
    ///
    /// Unknown identifiers are accepted: the job may have finished already
    /// or may not have started yet.
    pub fn record(&self, business_id: &str) -> AckReceipt {
        let receipt = {
            let mut entries = self.entries.write();
            match entries.get(business_id) {
                Some(acked_at) => AckReceipt {
                    acked_at: *acked_at,
                    first: false,
                },
                None => {
                    let acked_at = Utc::now();
                    entries.insert(business_id.to_string(), acked_at);
                    AckReceipt {
                        acked_at,
                        first: true,
                    }
                }
            }
        };

        if receipt.first {
            info!(business_id = %business_id, "ACK recorded");
            self.written.notify_waiters();
        } else {
            debug!(business_id = %business_id, "Duplicate ACK ignored");
        }

        receipt
    }

    /// Non-blocking check.
    pub fn is_acked(&self, business_id: &str) -> bool {
        self.entries.read().contains_key(business_id)
    }

    /// When `business_id` was first acknowledged, if ever.
    pub fn acked_at(&self, business_id: &str) -> Option<DateTime<Utc>> {
        self.entries.read().get(business_id).copied()
    }

    /// Number of distinct acknowledged identifiers.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Wait until `business_id` is acknowledged or `deadline` passes.
    ///
    /// Wakes on every registry write and additionally re-checks every
    /// `poll_interval`. Returns whether the ACK was observed.
    pub async fn wait_until(
        &self,
        business_id: &str,
        deadline: Instant,
        poll_interval: Duration,
    ) -> bool {
        loop {
            // Register interest before checking so a write between the
            // check and the await is not missed.
            let written = self.written.notified();
            tokio::pin!(written);
            written.as_mut().enable();

            if self.is_acked(business_id) {
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let next_check = (now + poll_interval).min(deadline);

            tokio::select! {
                _ = &mut written => {}
                _ = tokio::time::sleep_until(next_check) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn record_then_read() {
        let registry = AckRegistry::new();
        assert!(!registry.is_acked("P-1"));
        assert!(registry.is_empty());

        let receipt = registry.record("P-1");

        assert!(receipt.first);
        assert!(registry.is_acked("P-1"));
        assert!(!registry.is_acked("P-2"));
        assert_eq!(registry.acked_at("P-1"), Some(receipt.acked_at));
    }

    #[test]
    fn repeated_ack_is_a_noop() {
        let registry = AckRegistry::new();
        let first = registry.record("P-1");
        let second = registry.record("P-1");

        assert!(first.first);
        assert!(!second.first);
        assert_eq!(first.acked_at, second.acked_at, "timestamp is not touched");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_writers_lose_nothing() {
        let registry = Arc::new(AckRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        registry.record(&format!("P-{}", t * 100 + i));
                        registry.record(&format!("shared-{}", i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 800 + 100);
        assert!(registry.is_acked("P-799"));
        assert!(registry.is_acked("shared-0"));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_returns_false_at_deadline() {
        let registry = AckRegistry::new();
        let start = Instant::now();
        let deadline = start + Duration::from_secs(1);

        let acked = registry
            .wait_until("P-1", deadline, Duration::from_millis(100))
            .await;

        assert!(!acked);
        assert!(Instant::now() >= deadline);
        assert!(Instant::now() - deadline < Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_returns_immediately_when_already_acked() {
        let registry = AckRegistry::new();
        registry.record("P-1");
        let start = Instant::now();

        let acked = registry
            .wait_until("P-1", start + Duration::from_secs(5), Duration::from_millis(100))
            .await;

        assert!(acked);
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn write_wakes_waiter_before_next_poll() {
        let registry = Arc::new(AckRegistry::new());
        let start = Instant::now();

        let writer = {
            let registry = registry.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(250)).await;
                registry.record("P-1");
            })
        };

        // Poll interval longer than the whole window: only the wake-up can
        // observe the write in time.
        let acked = registry
            .wait_until("P-1", start + Duration::from_secs(10), Duration::from_secs(60))
            .await;
        writer.await.unwrap();

        assert!(acked);
        let elapsed = Instant::now() - start;
        assert!(elapsed >= Duration::from_millis(250));
        assert!(elapsed < Duration::from_millis(260), "woke at {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn unrelated_write_does_not_end_wait() {
        let registry = Arc::new(AckRegistry::new());
        let start = Instant::now();

        {
            let registry = registry.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                registry.record("other");
            });
        }

        let acked = registry
            .wait_until("P-1", start + Duration::from_secs(1), Duration::from_millis(300))
            .await;

        assert!(!acked);
        let elapsed = Instant::now() - start;
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_millis(1010), "returned at {elapsed:?}");
    }
}
