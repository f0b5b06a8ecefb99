//! Handler traits and type erasure.
//!
//! # How async handlers are stored
//!
//! The route table holds handlers of *different* closure types in one `Vec`,
//! and the middleware table does the same. Rust collections hold one concrete
//! type, so both sit behind trait objects:
//!
//! ```text
//! async fn hello(req: Request, res: Response) { … }   ← user writes this
//!        ↓ app.get("/", hello)
//! hello.into_boxed_handler()                          ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                          ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req, res)  at request time             ← one vtable dispatch
//! ```
//!
//! Middleware follows the same path with one extra argument, the [`Next`]
//! continuation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::middleware::Next;
use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future driving one link of the chain.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

// ── Route handlers ────────────────────────────────────────────────────────────

#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, res: Response) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// Satisfied automatically by any function or closure shaped like
///
/// ```text
/// async fn name(req: Request, res: Response)
/// ```
///
/// The handler answers through `res`. It receives no continuation: a route
/// handler is always the last link of the chain.
pub trait Handler: private::SealedHandler + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

impl<F, Fut> private::SealedHandler for F
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(Request, Response) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, req: Request, res: Response) -> BoxFuture {
        Box::pin((self.0)(req, res))
    }
}

// ── Middleware ────────────────────────────────────────────────────────────────

#[doc(hidden)]
pub trait ErasedMiddleware {
    fn call(&self, req: Request, res: Response, next: Next) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedMiddleware = Arc<dyn ErasedMiddleware + Send + Sync + 'static>;

/// Implemented for every valid middleware.
///
/// Satisfied automatically by any function or closure shaped like
///
/// ```text
/// async fn name(req: Request, res: Response, next: Next)
/// ```
///
/// Awaiting `next.run()` hands control to the rest of the chain. Returning
/// without doing so stops the chain right there.
pub trait Middleware: private::SealedMiddleware + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_middleware(self) -> BoxedMiddleware;
}

impl<F, Fut> private::SealedMiddleware for F
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn into_boxed_middleware(self) -> BoxedMiddleware {
        Arc::new(FnMiddleware(self))
    }
}

struct FnMiddleware<F>(F);

impl<F, Fut> ErasedMiddleware for FnMiddleware<F>
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, req: Request, res: Response, next: Next) -> BoxFuture {
        Box::pin((self.0)(req, res, next))
    }
}

/// The sealing module. Because these traits are private, external crates
/// cannot implement `Handler` or `Middleware` on their own types.
mod private {
    pub trait SealedHandler {}
    pub trait SealedMiddleware {}
}
