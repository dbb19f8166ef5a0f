//! Route targets and what they return.

use crate::error::ServerResult;
use crate::http::{Request, Response};
use crate::router::RouteTarget;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

pub type RouteResult = ServerResult<Outcome>;
pub type RouteFuture = BoxFuture<'static, RouteResult>;

/// The result of running one matched route.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The route produced the response; dispatch is complete.
    Handled(Response),
    /// The route declines the request; the next matching route is tried.
    Pass,
    /// The response is final; the rest of the dispatch cycle is skipped.
    Stop(Response),
}

impl Outcome {
    /// Stops dispatch with a plain-text response.
    pub fn halt(status: u16, body: impl AsRef<str>) -> Outcome {
        let mut response = Response::new(status);
        response.body(body);
        Outcome::Stop(response)
    }

    pub fn is_handled(&self) -> bool {
        matches!(self, Outcome::Handled(_))
    }
}

pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Outcome {
        Outcome::Handled(self)
    }
}

pub trait Handler: Send + Sync + 'static {
    fn handle(&self, req: Request) -> RouteFuture;

    fn dyn_clone(&self) -> Box<dyn Handler>;
}

impl Clone for Box<dyn Handler> {
    fn clone(&self) -> Box<dyn Handler> {
        self.dyn_clone()
    }
}

impl<F, Fut, O> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = ServerResult<O>> + Send + 'static,
    O: IntoOutcome,
{
    fn handle(&self, req: Request) -> RouteFuture {
        (self)(req)
            .map(|result| result.map(IntoOutcome::into_outcome))
            .boxed()
    }

    fn dyn_clone(&self) -> Box<dyn Handler> {
        Box::new(self.clone())
    }
}

/// Wraps an async closure as a route target.
pub fn from_fn<F, Fut, O>(f: F) -> RouteTarget
where
    F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = ServerResult<O>> + Send + 'static,
    O: IntoOutcome,
{
    RouteTarget::Handler(Box::new(f))
}

/// Binds a method to an existing instance, the `[instance, "method"]` form
/// of a route target. Every call reuses the same instance.
pub fn bind<C, M, Fut, O>(instance: Arc<C>, method: M) -> RouteTarget
where
    C: Send + Sync + 'static,
    M: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ServerResult<O>> + Send + 'static,
    O: IntoOutcome,
{
    let method = Arc::new(method);
    from_fn(move |req| method(instance.clone(), req))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerError;
    use crate::http::Method;

    struct Counter {
        label: &'static str,
    }

    impl Counter {
        async fn describe(self: Arc<Self>, req: Request) -> ServerResult<Response> {
            Ok(Response::text(format!("{} {}", self.label, req.args.join(","))))
        }
    }

    fn handler_of(target: RouteTarget) -> Box<dyn Handler> {
        match target {
            RouteTarget::Handler(handler) => handler,
            RouteTarget::Controller { .. } => panic!("expected a handler"),
        }
    }

    #[tokio::test]
    async fn closures_forward_the_request_unchanged() {
        let handler = handler_of(from_fn(|req: Request| async move {
            Ok(Response::text(format!("{} {} {:?}", req.method, req.path, req.args)))
        }));
        let mut req = Request::new(Method::POST, "/echo");
        req.args = vec!["a".into(), "b".into()];

        let outcome = handler.handle(req).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Handled(Response::text(r#"POST /echo ["a", "b"]"#))
        );
    }

    #[tokio::test]
    async fn bound_methods_share_their_instance() {
        let instance = Arc::new(Counter { label: "count" });
        let handler = handler_of(bind(instance.clone(), Counter::describe));
        let mut req = Request::new(Method::GET, "/");
        req.args = vec!["1".into(), "2".into()];

        let outcome = handler.handle(req).await.unwrap();
        assert_eq!(outcome, Outcome::Handled(Response::text("count 1,2")));
        assert_eq!(Arc::strong_count(&instance), 2);
    }

    #[tokio::test]
    async fn outcomes_and_errors_pass_through() {
        let pass = handler_of(from_fn(|_req| async { Ok(Outcome::Pass) }));
        assert_eq!(pass.handle(Request::new(Method::GET, "/")).await.unwrap(), Outcome::Pass);

        let failing = handler_of(from_fn(|_req| async {
            Err::<Response, _>(ServerError::Forbidden("nope".into()))
        }));
        let err = failing.handle(Request::new(Method::GET, "/")).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn halt_builds_a_stop_outcome() {
        match Outcome::halt(503, "maintenance") {
            Outcome::Stop(response) => {
                assert_eq!(response.status, 503);
                assert_eq!(response.body, "maintenance");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!Outcome::Pass.is_handled());
    }
}
