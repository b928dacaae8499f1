//! Command-line and environment configuration.

use crate::error::{ProxyError, ProxyResult};
use card_issuer_client::{IssuerCredentials, DEFAULT_MERCHANT_CODE};
use clap::Parser;
use std::convert::Infallible;
use observability::{LogConfig, LogFormat};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use webhook_courier::DeliveryConfig;

/// Payment proxy: issues virtual cards and delivers the outcome to a
/// webhook until the consumer acknowledges it.
#[derive(Parser, Debug, Clone)]
#[command(name = "payment-proxy")]
#[command(about = "Virtual card payment proxy with acknowledged webhook delivery")]
pub struct Args {
    /// Token callers must send as `x_studio_proxy_auth_token`.
    /// Unset or empty disables the check.
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Simulate the card issuer instead of calling it.
    #[arg(long, env = "TEST_MODE", value_parser = env_flag)]
    pub test_mode: bool,

    /// Card issuer API endpoint (live mode).
    #[arg(long, env = "WEX_API_URL")]
    pub wex_api_url: Option<String>,

    /// Card issuer username (live mode).
    #[arg(long, env = "WEX_USERNAME")]
    pub wex_username: Option<String>,

    /// Card issuer password (live mode).
    #[arg(long, env = "WEX_PASSWORD", hide_env_values = true)]
    pub wex_password: Option<String>,

    /// Merchant code sent with every issuing request.
    #[arg(long, env = "MERCHANT_CODE", default_value = DEFAULT_MERCHANT_CODE)]
    pub merchant_code: String,

    /// Downstream webhook receiving every outcome.
    #[arg(long, env = "WEBHOOK_URL")]
    pub webhook_url: String,

    /// Address to listen on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Attempts per successful outcome, including the first.
    #[arg(long, env = "COURIER_MAX_ATTEMPTS", default_value_t = 5)]
    pub max_attempts: u32,

    /// Seconds each attempt waits for an ACK.
    #[arg(long, env = "COURIER_ACK_TIMEOUT_SECONDS", default_value_t = 30.0)]
    pub ack_timeout_seconds: f64,

    /// Backoff after attempt n is base * 2^(n-1) seconds.
    #[arg(long, env = "COURIER_BACKOFF_BASE_SECONDS", default_value_t = 2.0)]
    pub backoff_base_seconds: f64,

    /// Optional cap on the backoff, in seconds.
    #[arg(long, env = "COURIER_BACKOFF_MAX_SECONDS")]
    pub backoff_max_seconds: Option<f64>,

    /// Randomize each backoff within [d/2, d].
    #[arg(long, env = "COURIER_BACKOFF_JITTER", value_parser = env_flag)]
    pub backoff_jitter: bool,

    /// Timeout for one webhook POST, in seconds.
    #[arg(long, env = "COURIER_POST_TIMEOUT_SECONDS", default_value_t = 10.0)]
    pub post_timeout_seconds: f64,

    /// Timeout for one card issuer call, in seconds.
    #[arg(long, env = "ISSUER_TIMEOUT_SECONDS", default_value_t = 30.0)]
    pub issuer_timeout_seconds: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Also write JSONL logs to this file.
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log JSON lines to stderr instead of compact text.
    #[arg(long)]
    pub log_json: bool,
}

/// Which card issuer the proxy calls.
#[derive(Debug, Clone)]
pub enum IssuerMode {
    /// No network; every request is approved with a fixed card.
    Simulated,
    Live {
        credentials: IssuerCredentials,
        timeout: Duration,
    },
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub auth_token: Option<String>,
    pub merchant_code: String,
    pub issuer: IssuerMode,
    pub delivery: DeliveryConfig,
}

impl Args {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            service_name: "payment-proxy".into(),
            default_level: self.log_level.clone(),
            log_path: self.log_file.clone(),
            also_stderr: true,
            format: if self.log_json {
                LogFormat::Json
            } else {
                LogFormat::Compact
            },
        }
    }

    /// Validate and resolve into a [`ProxyConfig`].
    pub fn into_config(self) -> ProxyResult<ProxyConfig> {
        let mut delivery = DeliveryConfig::from_seconds(
            self.webhook_url,
            self.max_attempts,
            self.ack_timeout_seconds,
            self.backoff_base_seconds,
            self.post_timeout_seconds,
        )?;
        if let Some(max) = self.backoff_max_seconds {
            delivery.backoff = delivery.backoff.with_max(seconds("backoff_max_seconds", max)?);
        }
        delivery.backoff = delivery.backoff.with_jitter(self.backoff_jitter);

        let issuer = if self.test_mode {
            IssuerMode::Simulated
        } else {
            let (Some(api_url), Some(username), Some(password)) =
                (self.wex_api_url, self.wex_username, self.wex_password)
            else {
                return Err(ProxyError::Config(
                    "live mode requires WEX_API_URL, WEX_USERNAME and WEX_PASSWORD \
                     (or set TEST_MODE=true)"
                        .to_string(),
                ));
            };
            IssuerMode::Live {
                credentials: IssuerCredentials {
                    api_url,
                    username,
                    password,
                },
                timeout: seconds("issuer_timeout_seconds", self.issuer_timeout_seconds)?,
            }
        };

        Ok(ProxyConfig {
            host: self.host,
            port: self.port,
            auth_token: self.auth_token.filter(|token| !token.is_empty()),
            merchant_code: self.merchant_code,
            issuer,
            delivery,
        })
    }
}

impl ProxyConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Log the effective configuration without secrets.
    pub fn log_summary(&self) {
        let issuer = match &self.issuer {
            IssuerMode::Simulated => "simulated".to_string(),
            IssuerMode::Live { credentials, .. } => credentials.api_url.clone(),
        };
        info!(
            bind = %self.bind_addr(),
            issuer = %issuer,
            merchant_code = %self.merchant_code,
            auth_required = self.auth_token.is_some(),
            webhook_url = %self.delivery.webhook_url,
            max_attempts = self.delivery.max_attempts,
            ack_timeout_secs = self.delivery.ack_timeout.as_secs_f64(),
            backoff_base_secs = self.delivery.backoff.base.as_secs_f64(),
            "Configuration loaded"
        );
    }
}

/// `true` in any letter case turns a flag on; any other value turns it off.
fn env_flag(value: &str) -> Result<bool, Infallible> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

fn seconds(name: &str, value: f64) -> ProxyResult<Duration> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ProxyError::Config(format!(
            "{name} must be a positive number of seconds, got {value}"
        )));
    }
    Duration::try_from_secs_f64(value).map_err(|e| ProxyError::Config(format!("{name}: {e}")))
}
