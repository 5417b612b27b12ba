//! # Decoy Core
//!
//! Core types for the Decoy stub HTTP server.
//!
//! This crate provides the configuration-time half of a stub route:
//!
//! - [`Fixture`] - A byte payload resolved once from a literal, a file, a
//!   reader, or a JSON/XML encoded value
//! - [`RouteExpectation`] - Fluent builder binding a path and method to an
//!   expected request body and a canned response
//! - [`BoundRoute`] - The validated, immutable form served by the dispatcher
//! - [`RouteError`] / [`FixtureError`] - Configuration-time failures

#![doc(html_root_url = "https://docs.rs/decoy-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod fixture;
pub mod route;

pub use error::{FixtureError, FixtureResult, FixtureSlot, RouteError};
pub use fixture::{Encoding, Fixture};
pub use route::{BoundRoute, RouteExpectation, DEFAULT_STATUS};
