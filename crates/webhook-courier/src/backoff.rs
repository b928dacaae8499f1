//! Exponential backoff between delivery attempts.

use rand::Rng;
use std::time::Duration;

/// Default base delay between the first and second attempt.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(2);

/// Maps an attempt number to the wait before the next attempt.
///
/// Implements binary exponential backoff:
/// - `delay = base * 2^(attempt - 1)`, optionally capped at `max`
///
/// # Examples (base=2s, no cap, no jitter)
///
/// | Attempt | Delay before next |
/// |---------|-------------------|
/// | 1       | 2s                |
/// | 2       | 4s                |
/// | 3       | 8s                |
/// | 4       | 16s               |
///
/// Jitter is off by default. When enabled the delay is drawn uniformly
/// from `[delay / 2, delay]`, which keeps the upper bound of the
/// documented schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay after the first attempt.
    pub base: Duration,
    /// Optional cap on the computed delay.
    pub max: Option<Duration>,
    /// Randomize each delay within `[delay / 2, delay]`.
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BACKOFF_BASE,
            max: None,
            jitter: false,
        }
    }
}

impl BackoffPolicy {
    /// Pure exponential policy with the given base, no cap and no jitter.
    pub fn exponential(base: Duration) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    /// Cap every delay at `max`.
    pub fn with_max(mut self, max: Duration) -> Self {
        self.max = Some(max);
        self
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Wait after `attempt` (1-based) before sending the next one.
    ///
    /// Attempt 0 is treated as 1. Large attempt numbers saturate instead
    /// of overflowing.
    pub fn wait(&self, attempt: u32) -> Duration {
        let delay = self.nominal(attempt);
        if !self.jitter || delay.is_zero() {
            return delay;
        }

        let half = delay / 2;
        let spread_ms = (delay - half).as_millis() as u64;
        if spread_ms == 0 {
            return delay;
        }
        half + Duration::from_millis(rand::thread_rng().gen_range(0..=spread_ms))
    }

    /// The deterministic schedule, ignoring jitter.
    pub fn nominal(&self, attempt: u32) -> Duration {
        let shift = attempt.max(1) - 1;
        let delay = 1u32
            .checked_shl(shift)
            .and_then(|multiplier| self.base.checked_mul(multiplier))
            .unwrap_or(Duration::MAX);

        match self.max {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}
