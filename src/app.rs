//! The application: route and middleware registration, and per-request
//! dispatch.
//!
//! # Dispatch
//!
//! Every request goes through the same steps:
//!
//! 1. **Preprocess.** Parse query and cookies, buffer and decode the body.
//!    A missing target (500), a body on a body-less method (400) or an
//!    oversized body (413) is answered right here. A body that cannot be
//!    read or decoded is logged and the request gets no response at all.
//! 2. **Match.** Look up the route for the exact method and normalized path.
//!    No route means `404 Not Found`, and no middleware runs.
//! 3. **Run the chain.** Matching middleware in registration order, then the
//!    route handler. The response goes out the moment a link calls
//!    [`Response::send`].

use std::net::SocketAddr;

use http::StatusCode;
use http_body_util::Full;
use tracing::{Instrument, debug, error, info_span};

use crate::error::{BoxError, Error};
use crate::handler::{Handler, Middleware};
use crate::method::Method;
use crate::middleware::{MiddlewareTable, Next};
use crate::path::normalize;
use crate::request::Request;
use crate::response::{HttpResponse, Response};
use crate::router::{Route, RouteTable, Router};
use crate::server::Server;

/// The application.
///
/// Build it once at startup; registration calls return `self` so they chain
/// naturally. Once serving starts the tables are read-only.
///
/// ```rust,no_run
/// use sprig::{App, Next, Request, Response};
///
/// # async fn run() -> Result<(), sprig::Error> {
/// App::new()
///     .middleware("*", |req: Request, _res: Response, next: Next| async move {
///         tracing::info!(path = req.path(), "incoming");
///         next.run().await;
///     })
///     .get("/", |_req: Request, res: Response| async move { res.send("Hello, World!") })
///     .listen(3000, "127.0.0.1")
///     .await
/// # }
/// ```
#[derive(Default)]
pub struct App {
    routes: RouteTable,
    middlewares: MiddlewareTable,
    max_body_size: Option<usize>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the size of a buffered request body. Larger bodies are answered
    /// with `413 Payload Too Large`. Unbounded by default.
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = Some(bytes);
        self
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes.push(Route {
            method,
            path: normalize(path).to_owned(),
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

    /// Registers middleware for every path under `prefix`, or for every
    /// path when `prefix` is `"*"`.
    pub fn middleware(mut self, prefix: &str, handler: impl Middleware) -> Self {
        self.middlewares.push(prefix, handler);
        self
    }

    /// Registers the routes built by `build` under `prefix`.
    pub fn group(mut self, prefix: &str, build: impl FnOnce(Router) -> Router) -> Self {
        for route in build(Router::new(prefix)).into_routes() {
            self.routes.push(route);
        }
        self
    }

    /// Binds `hostname:port` and serves until SIGTERM or Ctrl-C.
    pub async fn listen(self, port: u16, hostname: &str) -> Result<(), Error> {
        self.listen_with(port, hostname, |_| {}).await
    }

    /// Like [`listen`](Self::listen), calling `on_ready` with the bound
    /// address once connections are being accepted.
    pub async fn listen_with(
        self,
        port: u16,
        hostname: &str,
        on_ready: impl FnOnce(SocketAddr) + Send,
    ) -> Result<(), Error> {
        let addr = tokio::net::lookup_host((hostname, port))
            .await?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, format!("cannot resolve {hostname}"))
            })?;
        Server::bind(addr).serve_with(self, on_ready).await
    }

    /// Number of registered routes and middleware entries.
    pub(crate) fn table_sizes(&self) -> (usize, usize) {
        (self.routes.len(), self.middlewares.len())
    }

    /// Dispatches one request and resolves to its response.
    ///
    /// `Err` means no response is written: the body could not be read or
    /// decoded, or the chain finished without sending. The server closes the
    /// connection in that case.
    pub async fn dispatch<B>(&self, req: http::Request<B>) -> Result<HttpResponse, Error>
    where
        B: hyper::body::Body,
        B::Error: Into<BoxError>,
    {
        let limit = self.max_body_size.unwrap_or(usize::MAX);
        let req = match Request::from_http(req, limit).await {
            Ok(req) => req,
            Err(e) => {
                return match e.status() {
                    Some(status) => Ok(plain(status, e.to_string())),
                    None => {
                        error!("{e}");
                        Err(e)
                    }
                };
            }
        };

        let path = normalize(req.path());
        let route = Method::from_http(req.method()).and_then(|m| self.routes.find(m, path));
        let Some(route) = route else {
            debug!(method = %req.method(), path, "no route matched");
            return Ok(plain(StatusCode::NOT_FOUND, "Not Found"));
        };

        let span = info_span!("request", method = %req.method(), path);
        let middlewares = self.middlewares.matching(path);
        let (res, sent) = Response::channel();
        let chain = Next::new(middlewares, route.handler.clone(), req, res);
        tokio::spawn(chain.run().instrument(span));

        sent.await.map_err(|_| Error::NoResponse)
    }
}

fn plain(status: StatusCode, body: impl Into<bytes::Bytes>) -> HttpResponse {
    let mut response = http::Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}
