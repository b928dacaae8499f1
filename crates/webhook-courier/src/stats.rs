//! Delivery counters for health reporting.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared by every job.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    started: AtomicU64,
    in_flight: AtomicU64,
    acked: AtomicU64,
    exhausted: AtomicU64,
    attempts_sent: AtomicU64,
    send_failures: AtomicU64,
    error_deliveries: AtomicU64,
}

/// Point-in-time copy of [`DeliveryStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Success jobs started.
    pub started: u64,
    /// Jobs not yet terminal.
    pub in_flight: u64,
    /// Jobs that ended on an ACK.
    pub acked: u64,
    /// Jobs that ran out of attempts.
    pub exhausted: u64,
    /// Stamped attempts handed to the transport.
    pub attempts_sent: u64,
    /// Attempts or error deliveries the transport rejected.
    pub send_failures: u64,
    /// One-shot error deliveries handed to the transport.
    pub error_deliveries: u64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn job_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn job_acked(&self) {
        self.acked.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn job_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn attempt_sent(&self) {
        self.attempts_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn send_failed(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn error_delivered(&self) {
        self.error_deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            acked: self.acked.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            attempts_sent: self.attempts_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            error_deliveries: self.error_deliveries.load(Ordering::Relaxed),
        }
    }
}
