//! Configuration for the webhook courier.
//!
//! All values are fixed at startup and shared read-only across jobs.

use crate::backoff::BackoffPolicy;
use crate::error::{CourierError, CourierResult};
use std::time::Duration;
use url::Url;

/// Default number of attempts per success outcome.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default time to wait for an ACK after each attempt.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for a single webhook POST.
pub const DEFAULT_POST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default re-check interval while waiting for an ACK.
pub const DEFAULT_ACK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Courier configuration.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Downstream webhook endpoint receiving every delivery.
    pub webhook_url: String,

    /// Attempts per success outcome, including the first.
    pub max_attempts: u32,

    /// How long each attempt waits for an ACK.
    pub ack_timeout: Duration,

    /// Wait between an empty ACK window and the next attempt.
    pub backoff: BackoffPolicy,

    /// Timeout for a single POST.
    pub post_timeout: Duration,

    /// Safety-net re-check interval during the ACK wait.
    pub ack_poll_interval: Duration,
}

impl DeliveryConfig {
    /// Create a config with defaults for everything but the URL.
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            backoff: BackoffPolicy::default(),
            post_timeout: DEFAULT_POST_TIMEOUT,
            ack_poll_interval: DEFAULT_ACK_POLL_INTERVAL,
        }
    }

    /// Build from the float-second options and validate.
    pub fn from_seconds(
        webhook_url: impl Into<String>,
        max_attempts: u32,
        ack_timeout_seconds: f64,
        backoff_base_seconds: f64,
        post_timeout_seconds: f64,
    ) -> CourierResult<Self> {
        let config = Self {
            max_attempts,
            ack_timeout: positive_seconds("ack_timeout_seconds", ack_timeout_seconds)?,
            backoff: BackoffPolicy::exponential(positive_seconds(
                "backoff_base_seconds",
                backoff_base_seconds,
            )?),
            post_timeout: positive_seconds("post_timeout_seconds", post_timeout_seconds)?,
            ..Self::new(webhook_url)
        };
        config.validate()?;
        Ok(config)
    }

    /// Build from environment variables, falling back to defaults.
    ///
    /// `WEBHOOK_URL` is required. Unparseable numbers are errors rather
    /// than silently replaced.
    pub fn from_env() -> CourierResult<Self> {
        let webhook_url = std::env::var("WEBHOOK_URL")
            .map_err(|_| CourierError::Config("WEBHOOK_URL is not set".to_string()))?;
        let mut config = Self::new(webhook_url);

        if let Some(value) = env_parse::<u32>("COURIER_MAX_ATTEMPTS")? {
            config.max_attempts = value;
        }
        if let Some(value) = env_parse::<f64>("COURIER_ACK_TIMEOUT_SECONDS")? {
            config.ack_timeout = positive_seconds("COURIER_ACK_TIMEOUT_SECONDS", value)?;
        }
        if let Some(value) = env_parse::<f64>("COURIER_BACKOFF_BASE_SECONDS")? {
            config.backoff.base = positive_seconds("COURIER_BACKOFF_BASE_SECONDS", value)?;
        }
        if let Some(value) = env_parse::<f64>("COURIER_BACKOFF_MAX_SECONDS")? {
            config.backoff.max = Some(positive_seconds("COURIER_BACKOFF_MAX_SECONDS", value)?);
        }
        if let Ok(raw) = std::env::var("COURIER_BACKOFF_JITTER") {
            config.backoff.jitter = raw.trim().eq_ignore_ascii_case("true");
        }
        if let Some(value) = env_parse::<f64>("COURIER_POST_TIMEOUT_SECONDS")? {
            config.post_timeout = positive_seconds("COURIER_POST_TIMEOUT_SECONDS", value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> CourierResult<()> {
        let url = Url::parse(&self.webhook_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CourierError::Config(format!(
                "webhook_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.max_attempts < 1 {
            return Err(CourierError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.ack_timeout.is_zero() {
            return Err(CourierError::Config(
                "ack_timeout must be greater than zero".to_string(),
            ));
        }
        if self.backoff.base.is_zero() {
            return Err(CourierError::Config(
                "backoff base must be greater than zero".to_string(),
            ));
        }
        if self.post_timeout.is_zero() {
            return Err(CourierError::Config(
                "post_timeout must be greater than zero".to_string(),
            ));
        }
        if self.ack_poll_interval.is_zero() {
            return Err(CourierError::Config(
                "ack_poll_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Poll interval never longer than the ACK window itself.
    pub fn effective_poll_interval(&self) -> Duration {
        self.ack_poll_interval.min(self.ack_timeout)
    }
}

fn positive_seconds(name: &str, seconds: f64) -> CourierResult<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(CourierError::Config(format!(
            "{name} must be a positive number of seconds, got {seconds}"
        )));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| CourierError::Config(format!("{name}: {e}")))
}

fn env_parse<T>(key: &str) -> CourierResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CourierError::Config(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::DEFAULT_BACKOFF_BASE;

    #[test]
    fn test_config_new() {
        let config = DeliveryConfig::new("https://hooks.example.com/outcomes");

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.ack_timeout, Duration::from_secs(30));
        assert_eq!(config.backoff.base, DEFAULT_BACKOFF_BASE);
        assert!(!config.backoff.jitter);
        assert_eq!(config.post_timeout, Duration::from_secs(10));
        assert_eq!(config.ack_poll_interval, Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_seconds_accepts_fractions() {
        let config =
            DeliveryConfig::from_seconds("http://localhost:9000/hook", 3, 0.5, 1.5, 2.0).unwrap();

        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.ack_timeout, Duration::from_millis(500));
        assert_eq!(config.backoff.base, Duration::from_millis(1500));
        assert_eq!(config.post_timeout, Duration::from_secs(2));
    }

    #[test]
    fn from_seconds_rejects_non_positive_values() {
        let url = "http://localhost/hook";
        assert!(DeliveryConfig::from_seconds(url, 0, 1.0, 1.0, 1.0).is_err());
        assert!(DeliveryConfig::from_seconds(url, 1, 0.0, 1.0, 1.0).is_err());
        assert!(DeliveryConfig::from_seconds(url, 1, 1.0, -2.0, 1.0).is_err());
        assert!(DeliveryConfig::from_seconds(url, 1, 1.0, 1.0, f64::NAN).is_err());
        assert!(DeliveryConfig::from_seconds(url, 1, f64::INFINITY, 1.0, 1.0).is_err());
    }

    #[test]
    fn validate_rejects_bad_urls() {
        let mut config = DeliveryConfig::new("not a url");
        assert!(matches!(config.validate(), Err(CourierError::InvalidUrl(_))));

        config.webhook_url = "ftp://example.com/hook".to_string();
        assert!(matches!(config.validate(), Err(CourierError::Config(_))));
    }

    // Only test in this crate touching the process environment.
    #[test]
    fn from_env_reads_overrides_and_rejects_garbage() {
        const KEYS: [&str; 5] = [
            "WEBHOOK_URL",
            "COURIER_MAX_ATTEMPTS",
            "COURIER_ACK_TIMEOUT_SECONDS",
            "COURIER_BACKOFF_MAX_SECONDS",
            "COURIER_BACKOFF_JITTER",
        ];
        for key in KEYS {
            std::env::remove_var(key);
        }
        assert!(matches!(DeliveryConfig::from_env(), Err(CourierError::Config(_))));

        std::env::set_var("WEBHOOK_URL", "http://localhost:9000/hook");
        std::env::set_var("COURIER_MAX_ATTEMPTS", "3");
        std::env::set_var("COURIER_ACK_TIMEOUT_SECONDS", "0.25");
        std::env::set_var("COURIER_BACKOFF_MAX_SECONDS", "");
        std::env::set_var("COURIER_BACKOFF_JITTER", "TRUE");
        let config = DeliveryConfig::from_env().unwrap();
        assert_eq!(config.webhook_url, "http://localhost:9000/hook");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.ack_timeout, Duration::from_millis(250));
        assert!(config.backoff.max.is_none());
        assert!(config.backoff.jitter);

        std::env::set_var("COURIER_MAX_ATTEMPTS", "three");
        assert!(matches!(DeliveryConfig::from_env(), Err(CourierError::Config(_))));

        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn poll_interval_is_clamped_to_ack_timeout() {
        let mut config = DeliveryConfig::new("http://localhost/hook");
        config.ack_timeout = Duration::from_millis(50);
        assert_eq!(config.effective_poll_interval(), Duration::from_millis(50));
    }
}
