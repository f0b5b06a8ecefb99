//! Route registration and lookup.
//!
//! Routes match on exact method and exact normalized path. There are no
//! path parameters and no patterns: `/users/42` and `/users/{id}` are just
//! two different strings.
//!
//! [`Router`] is the builder handed to [`App::group`](crate::App::group). It
//! carries a prefix and collects routes; when the group closure returns, its
//! routes are appended to the application's [`RouteTable`] in order.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::path::normalize;

/// A registered `(method, normalized path, handler)` triple.
pub(crate) struct Route {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) handler: BoxedHandler,
}

// ── Router (group builder) ────────────────────────────────────────────────────

/// Collects the routes of one group.
///
/// Every path registered here is prefixed with the group's prefix. Each call
/// returns `self` so registrations chain naturally:
///
/// ```rust,no_run
/// # use sprig::{App, Request, Response};
/// # async fn home(_: Request, _: Response) {}
/// # async fn stats(_: Request, _: Response) {}
/// App::new().group("/admin", |admin| {
///     admin
///         .get("/", home)
///         .group("/dashboard", |dashboard| dashboard.get("/stats", stats))
/// });
/// // GET /admin and GET /admin/dashboard/stats are now routable.
/// ```
pub struct Router {
    prefix: String,
    routes: Vec<Route>,
}

impl Router {
    pub(crate) fn new(prefix: &str) -> Self {
        Self { prefix: normalize(prefix).to_owned(), routes: Vec::new() }
    }

    /// Register a handler for a method + path pair under this group's prefix.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        let full = format!("{}{path}", self.prefix);
        self.routes.push(Route {
            method,
            path: normalize(&full).to_owned(),
            handler: handler.into_boxed_handler(),
        });
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, path, handler)
    }

    pub fn head(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Head, path, handler)
    }

    pub fn options(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Options, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Patch, path, handler)
    }

    /// Opens a nested group at `self.prefix + prefix`.
    pub fn group(mut self, prefix: &str, build: impl FnOnce(Router) -> Router) -> Self {
        let nested = build(Router::new(&format!("{}{prefix}", self.prefix)));
        self.routes.extend(nested.routes);
        self
    }

    pub(crate) fn into_routes(self) -> Vec<Route> {
        self.routes
    }
}

// ── RouteTable ────────────────────────────────────────────────────────────────

/// Ordered, append-only list of routes.
///
/// The index maps each method, then each path, to its first registration,
/// so a duplicate registration is kept in the list but never served.
#[derive(Default)]
pub(crate) struct RouteTable {
    routes: Vec<Route>,
    index: HashMap<Method, HashMap<String, usize>>,
}

impl RouteTable {
    pub(crate) fn push(&mut self, route: Route) {
        let slot = self.routes.len();
        match self.index.entry(route.method).or_default().entry(route.path.clone()) {
            Entry::Vacant(e) => {
                e.insert(slot);
            }
            Entry::Occupied(_) => {
                tracing::debug!(method = %route.method, path = %route.path, "duplicate route is unreachable");
            }
        }
        self.routes.push(route);
    }

    /// First route registered for `method` at `path`.
    ///
    /// `path` must already be normalized.
    pub(crate) fn find(&self, method: Method, path: &str) -> Option<&Route> {
        let slot = *self.index.get(&method)?.get(path)?;
        self.routes.get(slot)
    }

    pub(crate) fn len(&self) -> usize {
        self.routes.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Request, Response};

    async fn noop(_: Request, _: Response) {}

    fn paths(router: Router) -> Vec<(Method, String)> {
        router.into_routes().into_iter().map(|r| (r.method, r.path)).collect()
    }

    #[test]
    fn root_router_normalizes_paths() {
        let routes = paths(Router::new("").get("/test/", noop).post("/", noop));
        assert_eq!(
            routes,
            [(Method::Get, "/test".to_owned()), (Method::Post, "/".to_owned())]
        );
    }

    #[test]
    fn groups_prefix_and_keep_order() {
        let router = Router::new("").get("/", noop).group("/admin", |admin| {
            admin
                .get("/", noop)
                .group("/dashboard/", |dashboard| dashboard.get("/", noop).get("/stats", noop))
                .delete("/users", noop)
        });

        assert_eq!(
            paths(router),
            [
                (Method::Get, "/".to_owned()),
                (Method::Get, "/admin".to_owned()),
                (Method::Get, "/admin/dashboard".to_owned()),
                (Method::Get, "/admin/dashboard/stats".to_owned()),
                (Method::Delete, "/admin/users".to_owned()),
            ]
        );
    }

    #[test]
    fn find_needs_exact_method_and_path() {
        let mut table = RouteTable::default();
        for route in Router::new("").get("/a", noop).put("/b", noop).into_routes() {
            table.push(route);
        }

        assert!(table.find(Method::Get, "/a").is_some());
        assert!(table.find(Method::Put, "/a").is_none());
        assert!(table.find(Method::Get, "/a/b").is_none());
        assert!(table.find(Method::Put, "/b").is_some());
    }

    #[test]
    fn first_duplicate_wins() {
        let mut table = RouteTable::default();
        for route in Router::new("").get("/x", noop).get("/x/", noop).into_routes() {
            table.push(route);
        }
        assert_eq!(table.len(), 2);

        let found = table.find(Method::Get, "/x").unwrap();
        assert!(Arc::ptr_eq(&found.handler, &table.routes[0].handler));
    }

    #[test]
    fn same_path_under_several_methods() {
        let mut table = RouteTable::default();
        for route in Router::new("").get("/x", noop).post("/x", noop).get("/x", noop).into_routes() {
            table.push(route);
        }

        let get = table.find(Method::Get, "/x").unwrap();
        let post = table.find(Method::Post, "/x").unwrap();
        assert!(Arc::ptr_eq(&get.handler, &table.routes[0].handler));
        assert!(Arc::ptr_eq(&post.handler, &table.routes[1].handler));
        assert!(table.find(Method::Delete, "/x").is_none());
    }
}
