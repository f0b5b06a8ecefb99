//! # sprig
//!
//! A minimal HTTP dispatch layer on top of hyper: exact routes, prefix-scoped
//! middleware, nested route groups, and requests that arrive with their
//! query, cookies and body already parsed.
//!
//! hyper owns the socket, HTTP framing and keep-alive. sprig owns what
//! happens between "a request arrived" and "a response was sent":
//!
//! - **Routing**: exact method + exact path, trailing slash ignored
//! - **Middleware**: `(prefix, handler)` pairs run in registration order,
//!   each deciding whether to call [`Next::run`]
//! - **Groups**: `app.group("/admin", |admin| ...)` prefixes a batch of routes
//! - **Preprocessing**: query map, cookie map, body buffered and decoded as
//!   JSON when the content type says so
//! - **Responses**: `send`, `set`, `set_cookie`, `clear_cookie`
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use sprig::{App, Next, Request, Response, StatusCode};
//!
//! #[tokio::main]
//! async fn main() {
//!     App::new()
//!         .middleware("/admin", guard)
//!         .get("/", hello)
//!         .group("/admin", |admin| admin.get("/", dashboard))
//!         .listen(3000, "127.0.0.1")
//!         .await
//!         .unwrap();
//! }
//!
//! async fn hello(req: Request, res: Response) {
//!     let name = req.query("name").unwrap_or("world");
//!     res.send(format!("Hello, {name}!"));
//! }
//!
//! async fn guard(req: Request, res: Response, next: Next) {
//!     match req.cookie("session") {
//!         Some(_) => next.run().await,
//!         None => res.send_status("Forbidden", StatusCode::FORBIDDEN),
//!     }
//! }
//!
//! async fn dashboard(_req: Request, res: Response) {
//!     res.send(serde_json::json!({ "visits": 10 }));
//! }
//! ```

mod app;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod cookie;
pub mod middleware;
pub mod path;

pub use app::App;
pub use cookie::{CookieOptions, SameSite};
pub use error::Error;
pub use handler::{Handler, Middleware};
pub use http::StatusCode;
pub use method::Method;
pub use middleware::Next;
pub use request::{Body, Request};
pub use response::{HttpResponse, Response};
pub use router::Router;
pub use server::Server;
