//! Logging bootstrap.
//!
//! # Example
//!
//! ```rust,ignore
//! use decoy_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//!
//! tracing::info!(http.path = "/_ping", "Route bound");
//! ```

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Environment variable overriding the configured filter.
pub const LOG_ENV_VAR: &str = "DECOY_LOG";

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g., "info", "decoy_server=debug").
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include span close events.
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Whether to write through libtest's captured output.
    pub test_writer: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            include_target: true,
            test_writer: false,
        }
    }
}

impl LogConfig {
    /// Human-readable output at debug level.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            include_target: true,
            test_writer: false,
        }
    }

    /// Compact output captured per test, quiet unless something is off.
    #[must_use]
    pub fn test() -> Self {
        Self {
            enabled: true,
            level: "warn".to_string(),
            json_format: false,
            span_events: false,
            file_line_info: false,
            include_target: true,
            test_writer: true,
        }
    }

    /// Returns the filter directive to apply, preferring [`LOG_ENV_VAR`].
    #[must_use]
    pub fn effective_level(&self) -> String {
        std::env::var(LOG_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.level.clone())
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::LoggingInit`] if the filter is invalid or a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.effective_level())?;

    let span_events = if config.span_events {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);

    let layer = match (config.json_format, config.test_writer) {
        (true, true) => layer.json().with_test_writer().with_filter(filter).boxed(),
        (true, false) => layer.json().with_filter(filter).boxed(),
        (false, true) => layer.compact().with_test_writer().with_filter(filter).boxed(),
        (false, false) => layer.pretty().with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Installs [`LogConfig::test()`] once per process.
///
/// Returns `false` if a subscriber was already installed.
pub fn try_init_test_logging() -> bool {
    init_logging(&LogConfig::test()).is_ok()
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns [`TelemetryError::LoggingInit`] if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}
