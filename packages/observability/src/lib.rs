//! # Observability
//!
//! Logging setup shared by the payment proxy binaries.
//!
//! Services call [`init_with_config`] once at startup and use the standard
//! `tracing` macros everywhere else. Library crates never install a
//! subscriber.
//!
//! ## Outputs
//!
//! - Console (stderr): compact human-readable lines, or one JSON object per
//!   line with [`LogFormat::Json`].
//! - Optional JSONL file: append-only, flushed per line, so
//!   `tail -f proxy.jsonl | jq` works while the service runs.
//!
//! `RUST_LOG` overrides `default_level` for every output.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() -> anyhow::Result<()> {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "payment-proxy".into(),
//!         default_level: "debug".into(),
//!         log_path: Some("logs/proxy.jsonl".into()),
//!         ..Default::default()
//!     })?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

mod json_layer;
mod writer;

pub use json_layer::{JsonLayer, LogEntry};
pub use writer::LogFileWriter;

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

/// Console line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every JSON line.
    pub service_name: String,

    /// Default level filter (e.g. "debug", "info,hyper=warn").
    /// Overridden by `RUST_LOG`.
    pub default_level: String,

    /// Optional JSONL log file.
    pub log_path: Option<PathBuf>,

    /// Keep console output when a log file is configured.
    pub also_stderr: bool,

    /// Console line format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
            format: LogFormat::Compact,
        }
    }
}

impl LogConfig {
    fn console_enabled(&self) -> bool {
        self.log_path.is_none() || self.also_stderr
    }
}

/// Logging could not be set up.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Initialize logging with custom configuration.
pub fn init_with_config(config: LogConfig) -> Result<(), InitError> {
    let file_layer = match &config.log_path {
        Some(path) => {
            let writer = LogFileWriter::open(path).map_err(|source| InitError::LogFile {
                path: path.clone(),
                source,
            })?;
            Some(JsonLayer::new(config.service_name.clone(), writer).with_filter(env_filter(&config)))
        }
        None => None,
    };

    let console = config.console_enabled();
    let compact_layer = (console && config.format == LogFormat::Compact).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&config))
    });
    let json_console_layer = (console && config.format == LogFormat::Json).then(|| {
        JsonLayer::new(config.service_name.clone(), io::stderr as fn() -> io::Stderr)
            .with_filter(env_filter(&config))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(compact_layer)
        .with(json_console_layer)
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        log_path = ?config.log_path,
        "observability initialized"
    );
    Ok(())
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(config.also_stderr);
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn console_is_kept_without_a_file() {
        let config = LogConfig {
            also_stderr: false,
            ..Default::default()
        };
        assert!(config.console_enabled());

        let config = LogConfig {
            log_path: Some("proxy.jsonl".into()),
            also_stderr: false,
            ..Default::default()
        };
        assert!(!config.console_enabled());
    }

    #[test]
    fn unwritable_log_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let err = init_with_config(LogConfig {
            log_path: Some(blocker.join("proxy.jsonl")),
            ..Default::default()
        })
        .unwrap_err();

        assert!(matches!(err, InitError::LogFile { .. }), "{err}");
    }
}
