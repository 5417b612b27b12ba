//! Request dispatch and matching.
//!
//! For every inbound request the [`Dispatcher`]:
//!
//! 1. looks up the exact request path in the bound [`RouteTable`],
//! 2. checks the method according to the configured [`MethodPolicy`],
//! 3. reads the whole request body,
//! 4. compares it byte-for-byte with the route's expected body and replies
//!    with either the canned response or a fixed `400` payload.
//!
//! Every reply declares `Content-Type: application/json`, including canned
//! bodies that are not JSON.

use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use parking_lot::RwLock;

use decoy_core::BoundRoute;

use crate::config::MethodPolicy;
use crate::table::RouteTable;

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Media type declared on every reply.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Body replied when the request body differs from the expected fixture.
pub const BODY_NOT_EQUAL: &str = r#"{"message": "body is not equal"}"#;

/// Body replied when the method differs and the policy is enforcing.
pub const METHOD_NOT_ALLOWED: &str = r#"{"message": "method is not allowed"}"#;

/// Body replied for paths with no bound route.
pub const ROUTE_NOT_FOUND: &str = r#"{"message": "route not found"}"#;

/// Body replied when the request body could not be read.
pub const BODY_READ_FAILED: &str = r#"{"message": "failed to read request body"}"#;

/// Matches requests against the bound route table and builds replies.
#[derive(Debug)]
pub struct Dispatcher {
    table: RwLock<Arc<RouteTable>>,
    method_policy: MethodPolicy,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty route table.
    #[must_use]
    pub fn new(method_policy: MethodPolicy) -> Self {
        Self {
            table: RwLock::new(Arc::new(RouteTable::new())),
            method_policy,
        }
    }

    /// Returns the method mismatch policy.
    #[must_use]
    pub fn method_policy(&self) -> MethodPolicy {
        self.method_policy
    }

    /// Returns a snapshot of the bound route table.
    #[must_use]
    pub fn table(&self) -> Arc<RouteTable> {
        Arc::clone(&*self.table.read())
    }

    /// Binds `routes` on top of the current table, later routes winning per
    /// path, and returns the number of bound paths.
    pub fn bind(&self, routes: impl IntoIterator<Item = BoundRoute>) -> usize {
        let mut table = self.table.write();
        let merged = table.merged(routes);
        let bound = merged.len();
        *table = Arc::new(merged);
        bound
    }

    /// Handles one request end to end.
    pub async fn dispatch<B>(&self, req: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes>,
        B::Error: Display,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        tracing::debug!(http.method = %method, http.path = %path, "Dispatching request");

        let Some(route) = self.table().get(&path).cloned() else {
            tracing::warn!(http.method = %method, http.path = %path, "No route bound for path");
            return reply(
                StatusCode::NOT_FOUND,
                Bytes::from_static(ROUTE_NOT_FOUND.as_bytes()),
            );
        };

        if !route.accepts_method(&method) {
            tracing::warn!(
                http.method = %method,
                http.path = %path,
                expected_method = %route.method(),
                policy = %self.method_policy,
                "Request method does not match route"
            );
            if self.method_policy == MethodPolicy::Enforce {
                return method_not_allowed(&route);
            }
        }

        let body = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                tracing::error!(http.path = %path, error = %e, "Failed to read request body");
                return reply(
                    StatusCode::BAD_REQUEST,
                    Bytes::from_static(BODY_READ_FAILED.as_bytes()),
                );
            }
        };

        respond(&route, &body)
    }
}

/// Builds the reply for `route` given the full request body.
#[must_use]
pub fn respond(route: &BoundRoute, body: &[u8]) -> HttpResponse {
    if route.matches_body(body) {
        tracing::debug!(
            http.path = route.path(),
            http.status_code = route.status().as_u16(),
            "Request body matched"
        );
        reply(route.status(), route.response_body().clone())
    } else {
        tracing::warn!(
            http.path = route.path(),
            expected_len = route.expected_body().len(),
            actual_len = body.len(),
            "Request body is not equal to the expected fixture"
        );
        reply(
            StatusCode::BAD_REQUEST,
            Bytes::from_static(BODY_NOT_EQUAL.as_bytes()),
        )
    }
}

fn method_not_allowed(route: &BoundRoute) -> HttpResponse {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(ALLOW, route.method().as_str())
        .body(Full::new(Bytes::from_static(METHOD_NOT_ALLOWED.as_bytes())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

fn reply(status: StatusCode, body: Bytes) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(Full::new(body))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

/// Returns `true` if `method` is one of the verbs defined by RFC 9110.
#[must_use]
pub fn is_standard_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET
            | Method::HEAD
            | Method::POST
            | Method::PUT
            | Method::DELETE
            | Method::CONNECT
            | Method::OPTIONS
            | Method::TRACE
            | Method::PATCH
    )
}
