//! The per-request handler chain.

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, BoxedMiddleware};
use crate::request::Request;
use crate::response::Response;

/// The continuation handed to every middleware.
///
/// Awaiting [`run`](Self::run) invokes the next middleware, or the route
/// handler once the middleware are exhausted. `run` consumes `self`, so a
/// link can pass control on at most once. Dropping a `Next` without running
/// it halts the chain: no later middleware and no route handler will run.
pub struct Next {
    middlewares: Arc<[BoxedMiddleware]>,
    route: BoxedHandler,
    index: usize,
    req: Request,
    res: Response,
}

impl Next {
    pub(crate) fn new(
        middlewares: Vec<BoxedMiddleware>,
        route: BoxedHandler,
        req: Request,
        res: Response,
    ) -> Self {
        Self { middlewares: middlewares.into(), route, index: 0, req, res }
    }

    /// Runs the rest of the chain.
    pub fn run(self) -> impl Future<Output = ()> + Send + 'static {
        self.advance()
    }

    fn advance(self) -> BoxFuture {
        let Self { middlewares, route, index, req, res } = self;
        match middlewares.get(index).cloned() {
            Some(middleware) => {
                let next = Self {
                    middlewares,
                    route,
                    index: index + 1,
                    req: req.clone(),
                    res: res.clone(),
                };
                middleware.call(req, res, next)
            }
            None => route.call(req, res),
        }
    }
}
