//! Error types for fixture resolution and route validation.
//!
//! Fixture failures are captured when a fixture is configured and only
//! surface once the owning route is validated, so a misconfigured route is
//! refused instead of silently serving an empty payload.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for fixture resolution.
pub type FixtureResult<T> = Result<T, FixtureError>;

/// Errors produced while turning a fixture source into bytes.
#[derive(Error, Debug)]
pub enum FixtureError {
    /// A fixture file could not be read.
    #[error("Failed to read fixture file {}: {source}", path.display())]
    Io {
        /// Path of the fixture file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A fixture reader failed before reaching end of input.
    #[error("Failed to read fixture stream: {source}")]
    Read {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding of a structured value failed.
    #[error("Failed to encode fixture as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// XML encoding of a structured value failed.
    #[error("Failed to encode fixture as XML: {0}")]
    Xml(String),
}

/// Which side of a route a fixture belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureSlot {
    /// The body the inbound request must match.
    Request,
    /// The body written back on a match.
    Response,
}

impl fmt::Display for FixtureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => f.write_str("request"),
            Self::Response => f.write_str("response"),
        }
    }
}

/// Errors raised when a configured route expectation is bound.
#[derive(Error, Debug)]
pub enum RouteError {
    /// The path does not start with `/` or carries a query or fragment.
    #[error("Invalid route path '{0}': must start with '/' and have no query or fragment")]
    InvalidPath(String),

    /// The method is not a valid HTTP method token.
    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),

    /// The configured status code is not a final status in `200..=999`.
    #[error("Invalid status code {0}: expected a final status in 200..=999")]
    InvalidStatus(u16),

    /// A response body was configured for a status that never carries one.
    #[error("Status code {0} cannot carry a response body")]
    BodyNotAllowed(u16),

    /// One of the route's fixtures failed to resolve.
    #[error("The {slot} fixture failed to resolve: {source}")]
    Fixture {
        /// The slot holding the broken fixture.
        slot: FixtureSlot,
        /// The resolution failure.
        #[source]
        source: FixtureError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_fixture_io_error_display() {
        let err = FixtureError::Io {
            path: PathBuf::from("testdata/nodes.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let message = err.to_string();
        assert!(message.contains("testdata/nodes.json"));
        assert!(message.contains("no such file"));
    }

    #[test]
    fn test_route_error_keeps_fixture_source() {
        let err = RouteError::Fixture {
            slot: FixtureSlot::Response,
            source: FixtureError::Xml("unsupported value".to_string()),
        };
        assert!(err.to_string().starts_with("The response fixture"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_body_not_allowed_display() {
        let err = RouteError::BodyNotAllowed(204);
        assert_eq!(err.to_string(), "Status code 204 cannot carry a response body");
    }

    #[test]
    fn test_fixture_slot_display() {
        assert_eq!(FixtureSlot::Request.to_string(), "request");
        assert_eq!(FixtureSlot::Response.to_string(), "response");
    }
}
