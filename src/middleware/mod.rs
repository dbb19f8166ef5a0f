use crate::error::ServerResult;
use crate::handler::{Handler, IntoOutcome, RouteFuture};
use crate::http::Request;
use futures::FutureExt;
use std::future::Future;

/// The rest of the chain, ending in the route target.
#[derive(Clone)]
pub struct Next {
    handler: Box<dyn Handler>,
}

impl Next {
    pub(crate) fn new(handler: Box<dyn Handler>) -> Self {
        Self { handler }
    }

    pub fn handle(&self, req: Request) -> RouteFuture {
        self.handler.handle(req)
    }
}

/// Runs before a route target on every matched dispatch.
///
/// A middleware may hand the request on with [`Next::handle`], or answer it
/// itself, including with [`Outcome::Pass`](crate::handler::Outcome::Pass)
/// or [`Outcome::Stop`](crate::handler::Outcome::Stop).
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> RouteFuture;
    fn clone_box(&self) -> Box<dyn Middleware>;
}

impl Clone for Box<dyn Middleware> {
    fn clone(&self) -> Box<dyn Middleware> {
        self.clone_box()
    }
}

#[derive(Clone)]
struct FnMiddleware<F> {
    f: F,
}

impl<F, Fut, O> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = ServerResult<O>> + Send + 'static,
    O: IntoOutcome,
{
    fn call(&self, req: Request, next: Next) -> RouteFuture {
        (self.f)(req, next)
            .map(|result| result.map(IntoOutcome::into_outcome))
            .boxed()
    }

    fn clone_box(&self) -> Box<dyn Middleware> {
        Box::new(self.clone())
    }
}

/// Wraps an async closure as middleware.
pub fn from_fn<F, Fut, O>(f: F) -> impl Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = ServerResult<O>> + Send + 'static,
    O: IntoOutcome,
{
    FnMiddleware { f }
}

/// An ordered middleware list; the first entry runs outermost.
#[derive(Clone, Default)]
pub(crate) struct MiddlewareChain {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: Box<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn extend(&mut self, other: &MiddlewareChain) {
        self.middlewares.extend(other.middlewares.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn run(&self, req: Request, handler: Box<dyn Handler>) -> RouteFuture {
        let mut next = Next::new(handler);
        for middleware in self.middlewares.iter().rev() {
            let middleware = middleware.clone();
            let inner = next.clone();
            next = Next::new(Box::new(move |req| middleware.call(req, inner.clone())));
        }
        next.handle(req)
    }
}
