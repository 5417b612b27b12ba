//! # Decoy Server
//!
//! A deterministic stub HTTP server for exercising client code in tests.
//!
//! This crate provides the serving half of Decoy:
//!
//! - [`StubServer`] - Binds an ephemeral local port, collects route
//!   expectations and serves them once registered
//! - [`Dispatcher`] - Exact path lookup, method policy and byte-exact body
//!   matching
//! - [`RouteTable`] - Immutable path-to-route mapping swapped in on
//!   registration
//! - [`StubConfig`] - Bind address and method mismatch policy
//!
//! ## Example
//!
//! ```rust,ignore
//! use decoy_server::StubServer;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn reports_version() {
//!     let mut server = StubServer::start().await.unwrap();
//!     server
//!         .add_route("/version", "GET")
//!         .reply(200)
//!         .response_json(&json!({"Version": "1.10.1", "Os": "linux"}));
//!     server.register().unwrap();
//!
//!     let client = DockerClient::new(server.url());
//!     assert_eq!(client.version().await.unwrap().version, "1.10.1");
//!
//!     server.stop().await;
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/decoy-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod server;
pub mod shutdown;
pub mod table;

pub use config::{ConfigError, MethodPolicy, StubConfig, StubConfigBuilder};
pub use dispatch::{
    Dispatcher, HttpResponse, ResponseBody, BODY_NOT_EQUAL, JSON_CONTENT_TYPE, METHOD_NOT_ALLOWED,
    ROUTE_NOT_FOUND,
};
pub use server::{ServerError, StubServer};
pub use shutdown::ShutdownSignal;
pub use table::RouteTable;
