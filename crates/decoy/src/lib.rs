//! # Decoy
//!
//! **Deterministic stub HTTP server for testing HTTP clients**
//!
//! Decoy stands in for a real HTTP backend while client code is under test.
//! Each route binds an exact path and method to:
//!
//! - an **expected request body**, compared byte-for-byte, and
//! - a **canned response**: status code plus body.
//!
//! Bodies are fixtures resolved once, at configuration time, from literals,
//! files, readers, or JSON/XML encoded values. A request whose body matches
//! gets the canned response; any other body gets `400` with
//! `{"message": "body is not equal"}`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use decoy::prelude::*;
//!
//! #[tokio::test]
//! async fn pings_the_daemon() {
//!     let mut server = StubServer::start().await.unwrap();
//!     server.add_route("/_ping", "GET").reply(200);
//!     server.register().unwrap();
//!
//!     let status = reqwest::get(server.url_for("/_ping")).await.unwrap().status();
//!     assert_eq!(status, 200);
//!
//!     server.stop().await;
//! }
//! ```
//!
//! ## Crates
//!
//! - [`core`] - fixtures and route expectations
//! - [`server`] - the listener, route table and dispatcher
//! - [`telemetry`] - logging setup for test runs

#![doc(html_root_url = "https://docs.rs/decoy/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use decoy_core as core;

pub use decoy_server as server;

pub use decoy_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use decoy::prelude::*;
///
/// let config = StubConfig::builder()
///     .method_policy(MethodPolicy::Advisory)
///     .build();
/// assert_eq!(config.method_policy(), MethodPolicy::Advisory);
/// ```
pub mod prelude {
    pub use decoy_core::{Encoding, Fixture, FixtureError, RouteError, RouteExpectation};
    pub use decoy_server::{MethodPolicy, ServerError, StubConfig, StubServer};
    pub use decoy_telemetry::{init_logging, try_init_test_logging, LogConfig};
}
