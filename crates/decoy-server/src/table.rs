//! The bound route table.
//!
//! A [`RouteTable`] maps exact request paths to [`BoundRoute`]s. Tables are
//! never mutated once built: registering more routes produces a new table
//! via [`RouteTable::merged`], and the dispatcher swaps it in atomically.
//!
//! # Example
//!
//! ```rust
//! use decoy_core::RouteExpectation;
//! use decoy_server::RouteTable;
//!
//! let ping = RouteExpectation::new("/_ping", "GET").bind().unwrap();
//! let table = RouteTable::from_routes([ping]);
//!
//! assert!(table.get("/_ping").is_some());
//! assert!(table.get("/_PING").is_none());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use decoy_core::BoundRoute;

/// Immutable mapping from exact path to route.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Arc<BoundRoute>>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from routes in registration order.
    ///
    /// When two routes share a path the later one wins.
    pub fn from_routes(routes: impl IntoIterator<Item = BoundRoute>) -> Self {
        Self::new().merged(routes)
    }

    /// Returns a new table holding this table's routes overlaid with
    /// `routes`, later entries winning per path.
    #[must_use]
    pub fn merged(&self, routes: impl IntoIterator<Item = BoundRoute>) -> Self {
        let mut merged = self.routes.clone();
        for route in routes {
            if merged.contains_key(route.path()) {
                tracing::debug!(path = route.path(), "Replacing bound route");
            }
            merged.insert(route.path().to_string(), Arc::new(route));
        }
        Self { routes: merged }
    }

    /// Looks up the route serving `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Arc<BoundRoute>> {
        self.routes.get(path)
    }

    /// Returns the number of bound paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no path is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the bound paths in sorted order.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decoy_core::RouteExpectation;

    fn route(path: &str, method: &str, body: &'static str) -> BoundRoute {
        let mut route = RouteExpectation::new(path, method);
        route.response_bytes(body);
        route.bind().unwrap()
    }

    #[test]
    fn test_empty_table() {
        let table = RouteTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert!(table.get("/").is_none());
    }

    #[test]
    fn test_exact_path_lookup() {
        let table = RouteTable::from_routes([route("/nodes", "GET", "[]")]);

        assert!(table.get("/nodes").is_some());
        assert!(table.get("/nodes/").is_none());
        assert!(table.get("/nodes/1").is_none());
        assert!(table.get("/Nodes").is_none());
    }

    #[test]
    fn test_later_route_wins() {
        let table = RouteTable::from_routes([
            route("/version", "GET", "first"),
            route("/version", "POST", "second"),
        ]);

        assert_eq!(table.len(), 1);
        let bound = table.get("/version").unwrap();
        assert_eq!(bound.response_body().as_ref(), b"second");
        assert_eq!(bound.method(), &http::Method::POST);
    }

    #[test]
    fn test_merged_keeps_existing_and_overrides() {
        let first = RouteTable::from_routes([
            route("/_ping", "GET", "OK"),
            route("/info", "GET", "old"),
        ]);
        let second = first.merged([route("/info", "GET", "new"), route("/nodes", "GET", "[]")]);

        assert_eq!(second.paths(), vec!["/_ping", "/info", "/nodes"]);
        assert_eq!(second.get("/info").unwrap().response_body().as_ref(), b"new");

        // The original table is untouched.
        assert_eq!(first.len(), 2);
        assert_eq!(first.get("/info").unwrap().response_body().as_ref(), b"old");
    }
}
