//! Integration tests for the webhook courier.
//!
//! All timing tests run on a paused Tokio clock, so backoff schedules are
//! checked to the millisecond without real sleeping.
//!
//! - `harness.rs`    - Recording transport and courier wiring
//! - `retries.rs`    - Attempt sequence, spacing and exhaustion without ACK
//! - `ack.rs`        - ACK stops delivery (in window, during backoff, early)
//! - `error_path.rs` - Failed upstream outcomes: one unstamped send
//! - `concurrency.rs` - Independent jobs and non-blocking start

mod error_path;
