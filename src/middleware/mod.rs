//! Prefix-scoped middleware.
//!
//! Middleware is registered against a path prefix (or `*` for everything)
//! and runs, in registration order, before the route handler of every
//! request whose path falls under that prefix:
//!
//! ```rust,no_run
//! use sprig::{App, Next, Request, Response, StatusCode};
//!
//! async fn admin_only(req: Request, res: Response, next: Next) {
//!     if req.header("authorization").is_some() {
//!         next.run().await;
//!     } else {
//!         res.send_status("Forbidden", StatusCode::FORBIDDEN);
//!     }
//! }
//!
//! let app = App::new().middleware("/admin", admin_only);
//! ```
//!
//! A prefix matches its own path and anything below a `/` boundary:
//! `/admin` covers `/admin` and `/admin/users`, not `/adminx`.

mod next;

pub use next::Next;

use std::sync::Arc;

use crate::handler::{BoxedMiddleware, Middleware};
use crate::path::normalize;

/// The prefix that matches every path.
pub const WILDCARD: &str = "*";

struct Entry {
    prefix: String,
    handler: BoxedMiddleware,
}

/// Ordered, append-only list of middleware entries.
#[derive(Default)]
pub(crate) struct MiddlewareTable {
    entries: Vec<Entry>,
}

impl MiddlewareTable {
    pub(crate) fn push(&mut self, prefix: &str, handler: impl Middleware) {
        self.entries.push(Entry {
            prefix: normalize(prefix).to_owned(),
            handler: handler.into_boxed_middleware(),
        });
    }

    /// Every handler whose prefix covers `path`, in registration order.
    ///
    /// `path` must already be normalized.
    pub(crate) fn matching(&self, path: &str) -> Vec<BoxedMiddleware> {
        self.entries
            .iter()
            .filter(|entry| covers(&entry.prefix, path))
            .map(|entry| Arc::clone(&entry.handler))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

fn covers(prefix: &str, path: &str) -> bool {
    if prefix == WILDCARD || prefix == path {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| prefix.ends_with('/') || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response};

    fn table(prefixes: &[&str]) -> MiddlewareTable {
        let mut table = MiddlewareTable::default();
        for prefix in prefixes {
            table.push(prefix, |_: Request, _: Response, next: Next| next.run());
        }
        table
    }

    #[test]
    fn prefix_boundary() {
        assert!(covers("/admin", "/admin"));
        assert!(covers("/admin", "/admin/dashboard"));
        assert!(!covers("/admin", "/adminx"));
        assert!(!covers("/admin", "/"));
        assert!(covers("*", "/anything/at/all"));
        assert!(covers("/", "/"));
        assert!(covers("/", "/ping"));
    }

    #[test]
    fn prefixes_are_normalized_on_insert() {
        let table = table(&["/admin/", "*"]);
        assert_eq!(table.entries[0].prefix, "/admin");
        assert_eq!(table.entries[1].prefix, "*");
    }

    #[test]
    fn matching_keeps_order_and_duplicates() {
        let table = table(&["*", "/admin", "/admin/", "/ping", "/admin"]);
        assert_eq!(table.len(), 5);

        let hits = table.matching("/admin");
        assert_eq!(hits.len(), 4);
        for (hit, idx) in hits.iter().zip([0, 1, 2, 4]) {
            assert!(Arc::ptr_eq(hit, &table.entries[idx].handler));
        }

        assert_eq!(table.matching("/ping").len(), 2);
        assert_eq!(table.matching("/adminx").len(), 1);
    }
}
