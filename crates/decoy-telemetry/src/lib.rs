//! Structured logging for the Decoy stub server.
//!
//! The server crates only emit `tracing` events; this crate installs a
//! `tracing-subscriber` to print them, as JSON for CI logs or pretty-printed
//! for local debugging.
//!
//! # Example
//!
//! ```rust,ignore
//! use decoy_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! ```

#![doc(html_root_url = "https://docs.rs/decoy-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, try_init_test_logging, LogConfig, LOG_ENV_VAR};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
