//! The stub server: listener lifecycle and route registration.
//!
//! # Lifecycle
//!
//! ```text
//! start() ──► Started ──► stop(self) ──► Stopped
//!               │  ▲
//!   add_route() │  │ register()
//!               ▼  │
//!          pending routes
//! ```
//!
//! `start` binds the listener and spawns the accept loop right away; paths
//! answer `404` until `register` binds them. `stop` consumes the server, so a
//! stopped server cannot be reused. Dropping a server without calling `stop`
//! shuts it down as well.
//!
//! # Example
//!
//! ```rust,ignore
//! use decoy_server::StubServer;
//!
//! let mut server = StubServer::start().await?;
//! server
//!     .add_route("/_ping", "GET")
//!     .reply(200)
//!     .response_text("OK");
//! server.register()?;
//!
//! let body = reqwest::get(server.url_for("/_ping")).await?.text().await?;
//! assert_eq!(body, "OK");
//!
//! server.stop().await;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use decoy_core::{BoundRoute, RouteError, RouteExpectation};

use crate::config::StubConfig;
use crate::dispatch::{is_standard_method, Dispatcher, HttpResponse};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::table::RouteTable;

/// URL scheme served by the stub server.
pub const SCHEME: &str = "http";

/// Errors raised by the stub server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The configured bind address is not a valid socket address.
    #[error("Invalid bind address '{0}'")]
    Address(String),

    /// The listener could not be bound.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configured route could not be registered.
    #[error("Failed to register route '{path}': {source}")]
    Route {
        /// The route's path as configured.
        path: String,
        /// Why the route was refused.
        #[source]
        source: RouteError,
    },
}

/// A running stub HTTP server bound to a local port.
#[derive(Debug)]
pub struct StubServer {
    addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    pending: Vec<RouteExpectation>,
    shutdown: ShutdownSignal,
    connections: ConnectionTracker,
    accept_loop: Option<JoinHandle<()>>,
}

impl StubServer {
    /// Starts a server on an ephemeral local port with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if no port can be bound. There is no
    /// retry; treat this as a failed test setup.
    pub async fn start() -> Result<Self, ServerError> {
        Self::start_with(StubConfig::default()).await
    }

    /// Starts a server with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Address`] for an unparsable bind address and
    /// [`ServerError::Bind`] if the listener cannot be bound.
    pub async fn start_with(config: StubConfig) -> Result<Self, ServerError> {
        let bind_addr = config.bind_addr();
        let requested = config
            .socket_addr()
            .map_err(|_| ServerError::Address(bind_addr.clone()))?;

        let listener = TcpListener::bind(requested)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;
        let addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: bind_addr,
            source,
        })?;

        let dispatcher = Arc::new(Dispatcher::new(config.method_policy()));
        let shutdown = ShutdownSignal::new();
        let connections = ConnectionTracker::new();

        let accept_loop = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&dispatcher),
            shutdown.clone(),
            connections.clone(),
        ));

        tracing::info!(
            addr = %addr,
            method_policy = %config.method_policy(),
            "Stub server listening"
        );

        Ok(Self {
            addr,
            dispatcher,
            pending: Vec::new(),
            shutdown,
            connections,
            accept_loop: Some(accept_loop),
        })
    }

    /// Returns the URL scheme (always `http`).
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        SCHEME
    }

    /// Returns the bound host as a string.
    #[must_use]
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Returns the bound port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Returns the bound socket address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the base URL, e.g. `http://127.0.0.1:41234`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}", SCHEME, self.addr)
    }

    /// Returns the URL for `path` on this server.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.url(), path)
        } else {
            format!("{}/{}", self.url(), path)
        }
    }

    /// Appends a route expectation and returns it for configuration.
    ///
    /// The route is served only after the next [`register`](Self::register).
    pub fn add_route(
        &mut self,
        path: impl Into<String>,
        method: impl AsRef<str>,
    ) -> &mut RouteExpectation {
        let index = self.pending.len();
        self.pending.push(RouteExpectation::new(path, method));
        &mut self.pending[index]
    }

    /// Returns the number of routes added since the last registration.
    #[must_use]
    pub fn pending_routes(&self) -> usize {
        self.pending.len()
    }

    /// Binds every pending route expectation, replacing earlier routes that
    /// share a path, and returns the number of bound paths.
    ///
    /// Either every pending route is bound or none is: if one fails
    /// validation, nothing from this call is served and the pending list is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Route`] for the first route with an invalid
    /// path, method or status, or a fixture that failed to resolve.
    pub fn register(&mut self) -> Result<usize, ServerError> {
        let pending = std::mem::take(&mut self.pending);
        let routes = match pending
            .into_iter()
            .map(|route| {
                let path = route.path().to_string();
                route
                    .bind()
                    .map_err(|source| ServerError::Route { path, source })
            })
            .collect::<Result<Vec<BoundRoute>, _>>()
        {
            Ok(routes) => routes,
            Err(e) => {
                tracing::error!(error = %e, "Refusing to register routes");
                return Err(e);
            }
        };

        for route in &routes {
            if !is_standard_method(route.method()) {
                tracing::warn!(
                    http.path = route.path(),
                    http.method = %route.method(),
                    "Route uses a non-standard method"
                );
            }
            tracing::debug!(
                http.path = route.path(),
                http.method = %route.method(),
                http.status_code = route.status().as_u16(),
                "Binding route"
            );
        }

        let bound = self.dispatcher.bind(routes);
        tracing::info!(routes = bound, "Routes registered");
        Ok(bound)
    }

    /// Returns a snapshot of the bound route table.
    #[must_use]
    pub fn routes(&self) -> Arc<RouteTable> {
        self.dispatcher.table()
    }

    /// Returns the number of connections currently open.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.connections.active_connections()
    }

    /// Stops the server and releases its port.
    ///
    /// Open connections are closed without waiting for in-flight requests.
    pub async fn stop(mut self) {
        self.shutdown.trigger();

        if let Some(handle) = self.accept_loop.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Accept loop ended abnormally");
            }
        }

        let open = self.connections.active_connections();
        if open > 0 {
            tracing::debug!(connections = open, "Closing connections without draining");
        }
        tracing::info!(addr = %self.addr, "Stub server stopped");
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.accept_loop.take() {
            handle.abort();
        }
    }
}

/// Accepts connections until shutdown, serving each on its own task.
async fn accept_loop(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown: ShutdownSignal,
    connections: ConnectionTracker,
) {
    let stopped = shutdown.recv();
    tokio::pin!(stopped);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, remote_addr)) => {
                        let dispatcher = Arc::clone(&dispatcher);
                        let shutdown = shutdown.clone();
                        let token = connections.acquire();

                        tokio::spawn(async move {
                            if let Err(e) = serve_connection(stream, dispatcher, shutdown).await {
                                tracing::debug!(remote_addr = %remote_addr, error = %e, "Connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                    }
                }
            }

            () = &mut stopped => {
                tracing::debug!("Shutdown signal received, closing listener");
                break;
            }
        }
    }
}

/// Serves HTTP/1.1 requests on one connection until it closes or shutdown.
async fn serve_connection(
    stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: Request<Incoming>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { Ok::<HttpResponse, Infallible>(dispatcher.dispatch(req).await) }
    });

    let conn = http1::Builder::new().serve_connection(io, service);

    tokio::select! {
        result = conn => result,
        () = shutdown.recv() => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MethodPolicy;
    use decoy_core::FixtureError;

    #[tokio::test]
    async fn test_start_binds_ephemeral_port() {
        let server = StubServer::start().await.unwrap();

        assert_eq!(server.scheme(), "http");
        assert_eq!(server.host(), "127.0.0.1");
        assert_ne!(server.port(), 0);
        assert_eq!(server.url(), format!("http://127.0.0.1:{}", server.port()));
        assert_eq!(server.url_for("/_ping"), format!("{}/_ping", server.url()));
        assert_eq!(server.url_for("_ping"), format!("{}/_ping", server.url()));

        server.stop().await;
    }

    #[tokio::test]
    async fn test_two_servers_get_distinct_ports() {
        let first = StubServer::start().await.unwrap();
        let second = StubServer::start().await.unwrap();

        assert_ne!(first.port(), second.port());

        first.stop().await;
        second.stop().await;
    }

    #[tokio::test]
    async fn test_start_with_invalid_host() {
        let config = StubConfig::builder().host("not-an-ip").build();
        let err = StubServer::start_with(config).await.unwrap_err();
        assert!(matches!(err, ServerError::Address(addr) if addr == "not-an-ip:0"));
    }

    #[tokio::test]
    async fn test_start_with_port_in_use() {
        let first = StubServer::start().await.unwrap();
        let config = StubConfig::builder().port(first.port()).build();

        let err = StubServer::start_with(config).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));

        first.stop().await;
    }

    #[tokio::test]
    async fn test_register_binds_pending_routes() {
        let mut server = StubServer::start().await.unwrap();
        server.add_route("/_ping", "get").reply(200);
        server.add_route("/version", "GET").response_text("{}");
        assert_eq!(server.pending_routes(), 2);

        assert_eq!(server.register().unwrap(), 2);
        assert_eq!(server.pending_routes(), 0);
        assert_eq!(server.routes().paths(), vec!["/_ping", "/version"]);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_register_again_is_last_write_wins() {
        let mut server = StubServer::start().await.unwrap();
        server.add_route("/info", "GET").response_text("first");
        server.register().unwrap();

        server.add_route("/info", "GET").response_text("second");
        assert_eq!(server.register().unwrap(), 1);

        let routes = server.routes();
        assert_eq!(routes.get("/info").unwrap().response_body().as_ref(), b"second");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_register_refuses_unresolved_fixture() {
        let mut server = StubServer::start().await.unwrap();
        server.add_route("/_ping", "GET");
        server
            .add_route("/nodes", "GET")
            .response_file("/missing/nodes.json");

        match server.register() {
            Err(ServerError::Route {
                path,
                source: RouteError::Fixture { source, .. },
            }) => {
                assert_eq!(path, "/nodes");
                assert!(matches!(source, FixtureError::Io { .. }));
            }
            other => panic!("Expected fixture error, got {other:?}"),
        }

        // Nothing from the failed call is served.
        assert!(server.routes().is_empty());
        assert_eq!(server.pending_routes(), 0);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_stop_releases_port() {
        let server = StubServer::start_with(
            StubConfig::builder()
                .method_policy(MethodPolicy::Advisory)
                .build(),
        )
        .await
        .unwrap();
        let addr = server.addr();

        server.stop().await;

        let rebound = TcpListener::bind(addr).await;
        assert!(rebound.is_ok(), "port should be free after stop");
    }

    #[tokio::test]
    async fn test_drop_releases_port() {
        let server = StubServer::start().await.unwrap();
        let addr = server.addr();
        drop(server);

        // The aborted accept loop drops the listener on the runtime.
        let mut rebound = TcpListener::bind(addr).await;
        for _ in 0..50 {
            if rebound.is_ok() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            rebound = TcpListener::bind(addr).await;
        }
        assert!(rebound.is_ok(), "port should be free after drop");
    }
}
