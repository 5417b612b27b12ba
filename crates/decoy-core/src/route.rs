//! Route expectations.
//!
//! A [`RouteExpectation`] binds one path and method to the body an inbound
//! request must carry and the canned response written back. It is configured
//! through chained calls and converted into an immutable [`BoundRoute`] when
//! the server registers it.
//!
//! # Example
//!
//! ```
//! use decoy_core::RouteExpectation;
//! use http::{Method, StatusCode};
//!
//! let mut route = RouteExpectation::new("/_ping", "get");
//! route.request_text("").reply(200).response_text("OK");
//!
//! let bound = route.bind().unwrap();
//! assert_eq!(bound.method(), &Method::GET);
//! assert_eq!(bound.status(), StatusCode::OK);
//! assert_eq!(bound.response_body(), &b"OK"[..]);
//! ```

use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use http::{Method, StatusCode};
use serde::Serialize;

use crate::error::{FixtureSlot, RouteError};
use crate::fixture::Fixture;

/// Status code replied when none is configured.
pub const DEFAULT_STATUS: u16 = 200;

/// A route expectation under construction.
#[derive(Debug)]
pub struct RouteExpectation {
    path: String,
    method: String,
    request: Fixture,
    status: u16,
    response: Fixture,
}

impl RouteExpectation {
    /// Creates an expectation for `path` and `method`.
    ///
    /// The method is upper-cased; the path is kept verbatim.
    pub fn new(path: impl Into<String>, method: impl AsRef<str>) -> Self {
        Self {
            path: path.into(),
            method: method.as_ref().to_ascii_uppercase(),
            request: Fixture::empty(),
            status: DEFAULT_STATUS,
            response: Fixture::empty(),
        }
    }

    /// Returns the configured path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the normalized method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the expected-request fixture.
    #[must_use]
    pub fn request(&self) -> &Fixture {
        &self.request
    }

    /// Returns the canned-response fixture.
    #[must_use]
    pub fn response(&self) -> &Fixture {
        &self.response
    }

    /// Returns the configured status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Sets the expected-request fixture.
    pub fn request_fixture(&mut self, fixture: Fixture) -> &mut Self {
        self.request = fixture;
        self
    }

    /// Expects the request body to equal `bytes`.
    pub fn request_bytes(&mut self, bytes: impl Into<Bytes>) -> &mut Self {
        self.request_fixture(Fixture::literal(bytes))
    }

    /// Expects the request body to equal `text`.
    pub fn request_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.request_fixture(Fixture::text(text))
    }

    /// Expects the request body to equal the contents of a file.
    pub fn request_file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.request_fixture(Fixture::file(path))
    }

    /// Expects the request body to equal everything `reader` yields.
    pub fn request_reader(&mut self, reader: impl Read) -> &mut Self {
        self.request_fixture(Fixture::reader(reader))
    }

    /// Expects the request body to equal the JSON encoding of `value`.
    pub fn request_json<T: Serialize + ?Sized>(&mut self, value: &T) -> &mut Self {
        self.request_fixture(Fixture::json(value))
    }

    /// Expects the request body to equal the XML encoding of `value`.
    pub fn request_xml<T: Serialize + ?Sized>(&mut self, value: &T) -> &mut Self {
        self.request_fixture(Fixture::xml(value))
    }

    /// Sets the status code written on a match.
    pub fn reply(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    /// Sets the canned-response fixture.
    pub fn response_fixture(&mut self, fixture: Fixture) -> &mut Self {
        self.response = fixture;
        self
    }

    /// Replies with `bytes`.
    pub fn response_bytes(&mut self, bytes: impl Into<Bytes>) -> &mut Self {
        self.response_fixture(Fixture::literal(bytes))
    }

    /// Replies with `text`.
    pub fn response_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.response_fixture(Fixture::text(text))
    }

    /// Replies with the contents of a file.
    pub fn response_file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.response_fixture(Fixture::file(path))
    }

    /// Replies with everything `reader` yields.
    pub fn response_reader(&mut self, reader: impl Read) -> &mut Self {
        self.response_fixture(Fixture::reader(reader))
    }

    /// Replies with the JSON encoding of `value`.
    pub fn response_json<T: Serialize + ?Sized>(&mut self, value: &T) -> &mut Self {
        self.response_fixture(Fixture::json(value))
    }

    /// Replies with the XML encoding of `value`.
    pub fn response_xml<T: Serialize + ?Sized>(&mut self, value: &T) -> &mut Self {
        self.response_fixture(Fixture::xml(value))
    }

    /// Validates the expectation and freezes it.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a path that is not absolute or
    /// carries a query or fragment, an invalid method, a status code that is
    /// not a final `200..=999` code, a fixture that failed to resolve, or a
    /// response body on `204`, `205` or `304`.
    pub fn bind(self) -> Result<BoundRoute, RouteError> {
        if !self.path.starts_with('/') || self.path.contains(['?', '#']) {
            return Err(RouteError::InvalidPath(self.path));
        }

        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|_| RouteError::InvalidMethod(self.method.clone()))?;

        // 1xx codes are interim responses and cannot end an exchange.
        let status = StatusCode::from_u16(self.status)
            .ok()
            .filter(|status| !status.is_informational())
            .ok_or(RouteError::InvalidStatus(self.status))?;

        let expected_body = self.request.into_bytes().map_err(|source| RouteError::Fixture {
            slot: FixtureSlot::Request,
            source,
        })?;

        let response_body = self.response.into_bytes().map_err(|source| RouteError::Fixture {
            slot: FixtureSlot::Response,
            source,
        })?;

        if !response_body.is_empty() && forbids_body(status) {
            return Err(RouteError::BodyNotAllowed(self.status));
        }

        Ok(BoundRoute {
            path: self.path,
            method,
            expected_body,
            status,
            response_body,
        })
    }
}

/// Returns `true` for statuses whose replies never carry a body on the wire.
fn forbids_body(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
    )
}

/// An immutable, validated route expectation ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundRoute {
    path: String,
    method: Method,
    expected_body: Bytes,
    status: StatusCode,
    response_body: Bytes,
}

impl BoundRoute {
    /// Returns the exact path this route serves.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the expected method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the body an inbound request must carry.
    #[must_use]
    pub fn expected_body(&self) -> &Bytes {
        &self.expected_body
    }

    /// Returns the status written on a match.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the body written on a match.
    #[must_use]
    pub fn response_body(&self) -> &Bytes {
        &self.response_body
    }

    /// Returns `true` if `method` equals the expected method, ignoring case.
    #[must_use]
    pub fn accepts_method(&self, method: &Method) -> bool {
        self.method
            .as_str()
            .eq_ignore_ascii_case(method.as_str())
    }

    /// Returns `true` if `body` is byte-for-byte the expected body.
    #[must_use]
    pub fn matches_body(&self, body: &[u8]) -> bool {
        self.expected_body.as_ref() == body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FixtureError;
    use proptest::prelude::*;

    #[test]
    fn test_method_is_upper_cased() {
        let route = RouteExpectation::new("/nodes", "get");
        assert_eq!(route.method(), "GET");
        assert_eq!(route.path(), "/nodes");
    }

    #[test]
    fn test_path_is_case_sensitive() {
        let route = RouteExpectation::new("/Nodes", "GET");
        assert_eq!(route.bind().unwrap().path(), "/Nodes");
    }

    #[test]
    fn test_defaults() {
        let route = RouteExpectation::new("/_ping", "GET");
        assert_eq!(route.status(), DEFAULT_STATUS);
        assert_eq!(route.request().payload(), Some(&b""[..]));
        assert_eq!(route.response().payload(), Some(&b""[..]));
    }

    #[test]
    fn test_chained_configuration() {
        let mut route = RouteExpectation::new("/services/create", "post");
        route
            .request_json(&serde_json::json!({"Name": "web"}))
            .reply(201)
            .response_json(&serde_json::json!({"ID": "svc-1"}));

        let bound = route.bind().unwrap();
        assert_eq!(bound.method(), &Method::POST);
        assert_eq!(bound.status(), StatusCode::CREATED);
        assert_eq!(bound.expected_body().as_ref(), br#"{"Name":"web"}"#);
        assert_eq!(bound.response_body().as_ref(), br#"{"ID":"svc-1"}"#);
    }

    #[test]
    fn test_later_fixture_replaces_earlier() {
        let mut route = RouteExpectation::new("/info", "GET");
        route.response_file("/missing/info.json").response_text("{}");
        assert_eq!(route.bind().unwrap().response_body().as_ref(), b"{}");
    }

    #[test]
    fn test_bind_rejects_relative_path() {
        let err = RouteExpectation::new("nodes", "GET").bind().unwrap_err();
        assert!(matches!(err, RouteError::InvalidPath(p) if p == "nodes"));
    }

    #[test]
    fn test_bind_rejects_invalid_method() {
        let err = RouteExpectation::new("/nodes", "GE T").bind().unwrap_err();
        assert!(matches!(err, RouteError::InvalidMethod(m) if m == "GE T"));
    }

    #[test]
    fn test_bind_rejects_invalid_status() {
        let mut route = RouteExpectation::new("/nodes", "GET");
        route.reply(42);
        assert!(matches!(route.bind(), Err(RouteError::InvalidStatus(42))));
    }

    #[test]
    fn test_bind_rejects_path_with_query_or_fragment() {
        for path in ["/q?x=1", "/a#b"] {
            let err = RouteExpectation::new(path, "GET").bind().unwrap_err();
            assert!(matches!(err, RouteError::InvalidPath(p) if p == path));
        }
    }

    #[test]
    fn test_bind_rejects_informational_status() {
        for code in [100, 101, 103, 199] {
            let mut route = RouteExpectation::new("/_ping", "GET");
            route.reply(code).response_text("hello");
            assert!(
                matches!(route.bind(), Err(RouteError::InvalidStatus(c)) if c == code),
                "{code} must be refused"
            );
        }
    }

    #[test]
    fn test_bind_rejects_body_on_bodiless_status() {
        for code in [204, 205, 304] {
            let mut route = RouteExpectation::new("/containers/web/stop", "POST");
            route.reply(code).response_text("hello");
            assert!(
                matches!(route.bind(), Err(RouteError::BodyNotAllowed(c)) if c == code),
                "{code} must refuse a body"
            );
        }
    }

    #[test]
    fn test_bodiless_status_without_body_is_accepted() {
        let mut route = RouteExpectation::new("/containers/web/stop", "POST");
        route.reply(204);
        let bound = route.bind().unwrap();
        assert_eq!(bound.status(), StatusCode::NO_CONTENT);
        assert!(bound.response_body().is_empty());
    }

    #[test]
    fn test_bind_accepts_nonstandard_final_status() {
        let mut route = RouteExpectation::new("/_ping", "GET");
        route.reply(599).response_text("hello");
        assert_eq!(route.bind().unwrap().status().as_u16(), 599);
    }

    #[test]
    fn test_bind_surfaces_request_fixture_error() {
        let mut route = RouteExpectation::new("/nodes", "GET");
        route.request_file("/missing/request.json");

        match route.bind() {
            Err(RouteError::Fixture { slot, source }) => {
                assert_eq!(slot, FixtureSlot::Request);
                assert!(matches!(source, FixtureError::Io { .. }));
            }
            other => panic!("Expected fixture error, got {other:?}"),
        }
    }

    #[test]
    fn test_bind_surfaces_response_fixture_error() {
        let mut route = RouteExpectation::new("/nodes", "GET");
        route.response_file("/missing/response.json");

        assert!(matches!(
            route.bind(),
            Err(RouteError::Fixture {
                slot: FixtureSlot::Response,
                ..
            })
        ));
    }

    #[test]
    fn test_custom_method_is_accepted() {
        let bound = RouteExpectation::new("/cache", "purge").bind().unwrap();
        assert_eq!(bound.method().as_str(), "PURGE");
        assert!(bound.accepts_method(&Method::from_bytes(b"PURGE").unwrap()));
        assert!(!bound.accepts_method(&Method::GET));
    }

    proptest! {
        #[test]
        fn prop_only_identical_bodies_match(
            expected in proptest::collection::vec(any::<u8>(), 0..64),
            actual in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let mut route = RouteExpectation::new("/echo", "POST");
            route.request_bytes(expected.clone());
            let bound = route.bind().unwrap();

            prop_assert!(bound.matches_body(&expected));
            prop_assert_eq!(bound.matches_body(&actual), expected == actual);
        }

        #[test]
        fn prop_single_byte_flip_never_matches(
            expected in proptest::collection::vec(any::<u8>(), 1..64),
            index in any::<prop::sample::Index>(),
        ) {
            let mut route = RouteExpectation::new("/echo", "POST");
            route.request_bytes(expected.clone());
            let bound = route.bind().unwrap();

            let mut actual = expected;
            let i = index.index(actual.len());
            actual[i] ^= 0x01;
            prop_assert!(!bound.matches_body(&actual));
        }
    }
}
