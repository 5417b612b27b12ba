//! Stub server configuration.
//!
//! # Example
//!
//! ```rust
//! use decoy_server::{MethodPolicy, StubConfig};
//!
//! let config = StubConfig::builder()
//!     .host("127.0.0.1")
//!     .method_policy(MethodPolicy::Advisory)
//!     .build();
//!
//! assert_eq!(config.bind_addr(), "127.0.0.1:0");
//! ```

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port (`0` lets the OS pick an ephemeral port).
pub const DEFAULT_PORT: u16 = 0;

/// Error raised when configuration cannot be loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held an unparsable value.
    #[error("Invalid value for {key}: {message}")]
    EnvParse {
        /// The offending variable.
        key: String,
        /// What was expected.
        message: String,
    },
}

impl ConfigError {
    fn env_parse(key: &str, message: impl Into<String>) -> Self {
        Self::EnvParse {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// How a request whose method differs from the route's method is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodPolicy {
    /// Reply `405 Method Not Allowed`.
    #[default]
    Enforce,
    /// Log the mismatch and serve the route anyway.
    Advisory,
}

impl fmt::Display for MethodPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enforce => f.write_str("enforce"),
            Self::Advisory => f.write_str("advisory"),
        }
    }
}

impl FromStr for MethodPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enforce" => Ok(Self::Enforce),
            "advisory" => Ok(Self::Advisory),
            other => Err(format!("expected 'enforce' or 'advisory', got '{other}'")),
        }
    }
}

/// Stub server configuration.
///
/// Use [`StubConfig::builder()`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubConfig {
    host: String,
    port: u16,
    method_policy: MethodPolicy,
}

impl StubConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> StubConfigBuilder {
        StubConfigBuilder::default()
    }

    /// Loads the defaults, overridden by `<PREFIX>_HOST`, `<PREFIX>_PORT`
    /// and `<PREFIX>_METHOD_POLICY` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvParse`] if a variable cannot be parsed.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    fn from_lookup(
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let mut builder = StubConfigBuilder::new();

        let key = format!("{prefix}_HOST");
        if let Some(host) = lookup(&key) {
            builder = builder.host(host);
        }

        let key = format!("{prefix}_PORT");
        if let Some(port) = lookup(&key) {
            let port = port
                .parse()
                .map_err(|_| ConfigError::env_parse(&key, "expected a port number"))?;
            builder = builder.port(port);
        }

        let key = format!("{prefix}_METHOD_POLICY");
        if let Some(policy) = lookup(&key) {
            let policy = policy
                .parse()
                .map_err(|e: String| ConfigError::env_parse(&key, e))?;
            builder = builder.method_policy(policy);
        }

        Ok(builder.build())
    }

    /// Returns the bind host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the bind port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the method mismatch policy.
    #[must_use]
    pub fn method_policy(&self) -> MethodPolicy {
        self.method_policy
    }

    /// Returns the bind address as `host:port`.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Parses the bind address as a `SocketAddr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not an IP literal.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.bind_addr().parse()
    }
}

impl Default for StubConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`StubConfig`].
#[derive(Debug, Clone)]
pub struct StubConfigBuilder {
    host: String,
    port: u16,
    method_policy: MethodPolicy,
}

impl StubConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            method_policy: MethodPolicy::default(),
        }
    }

    /// Sets the bind host (an IP literal).
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets a fixed bind port.
    ///
    /// Leave at `0` unless a test needs a known port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the method mismatch policy.
    #[must_use]
    pub fn method_policy(mut self, policy: MethodPolicy) -> Self {
        self.method_policy = policy;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> StubConfig {
        StubConfig {
            host: self.host,
            port: self.port,
            method_policy: self.method_policy,
        }
    }
}

impl Default for StubConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
