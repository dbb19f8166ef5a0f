//! Application is the entry point: it owns the route table, the controller
//! registry and the lifecycle hooks, and dispatches requests.
//!
//! # Examples
//!
//! ```rust
//! use controller_router::app::Application;
//! use controller_router::config::Settings;
//! use controller_router::error::ServerResult;
//! use controller_router::http::{Method, Request, Response};
//!
//! struct GreeterController;
//!
//! impl GreeterController {
//!     async fn hi(self, req: Request) -> ServerResult<Response> {
//!         Ok(Response::text(format!("Hello, {}!", req.args()[0])))
//!     }
//! }
//!
//! # futures::executor::block_on(async {
//! let mut app = Application::with_settings(Settings::default().controller_suffix("Controller"));
//! app.register_controller("GreeterController", |_ctx| GreeterController)
//!     .action("hi", GreeterController::hi);
//! app.get("/hello/:name", "Greeter:hi").unwrap();
//!
//! let response = app.handle(Request::new(Method::GET, "/hello/world")).await;
//! assert_eq!(response.body, "Hello, world!");
//! # });
//! ```

use crate::config::Settings;
use crate::controller::{ControllerBuilder, ControllerContext, ControllerRegistry};
use crate::error::{RouteError, ServerError, ServerResult};
use crate::handler::{Handler, IntoOutcome, Outcome, RouteFuture};
use crate::hooks::{Hook, Hooks, DEFAULT_PRIORITY};
use crate::http::{Request, Response};
use crate::middleware::Middleware;
use crate::router::{Group, Route, RouteTarget, Router};
use crate::state::State;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

type ErrorHandler = Arc<dyn Fn(ServerError) -> Response + Send + Sync>;

/// Shared application data handed to every request and controller.
#[derive(Clone, Default)]
pub struct AppContext {
    settings: Arc<Settings>,
    controllers: Arc<ControllerRegistry>,
    state: State,
    not_found: Option<Box<dyn Handler>>,
    on_error: Option<ErrorHandler>,
}

impl AppContext {
    pub(crate) fn new(
        settings: Arc<Settings>,
        controllers: Arc<ControllerRegistry>,
        state: State,
    ) -> Self {
        Self {
            settings,
            controllers,
            state,
            not_found: None,
            on_error: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Answers with the not-found handler and halts dispatch.
    pub fn not_found(&self, req: Request) -> RouteFuture {
        let handler = self.not_found.clone();
        async move {
            let outcome = match handler {
                Some(handler) => handler.handle(req).await?,
                None => Outcome::Pass,
            };
            Ok(match outcome {
                Outcome::Handled(response) | Outcome::Stop(response) => Outcome::Stop(response),
                Outcome::Pass => Outcome::Stop(Response::error(ServerError::NotFound)),
            })
        }
        .boxed()
    }

    /// Answers with the error handler and halts dispatch.
    pub fn error(&self, error: ServerError) -> Outcome {
        Outcome::Stop(self.error_response(error))
    }

    pub(crate) fn error_response(&self, error: ServerError) -> Response {
        if error.status_code() >= 500 {
            tracing::error!(error = %error, "Request failed");
        }
        match &self.on_error {
            Some(handler) => handler(error),
            None => Response::error(error),
        }
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("settings", &self.settings)
            .field("controllers", &self.controllers)
            .field("state", &self.state)
            .field("not_found", &self.not_found.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

enum Dispatched {
    Complete(Response),
    Stopped(Response),
}

#[derive(Clone)]
pub struct Application {
    settings: Arc<Settings>,
    router: Router,
    controllers: Arc<ControllerRegistry>,
    state: State,
    hooks: Hooks,
    not_found: Option<Box<dyn Handler>>,
    on_error: Option<ErrorHandler>,
}

impl Application {
    /// Creates an application with default settings.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let settings = Arc::new(settings);
        Self {
            router: Router::with_settings(settings.clone()),
            settings,
            controllers: Arc::new(ControllerRegistry::new()),
            state: State::new(),
            hooks: Hooks::new(),
            not_found: None,
            on_error: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn controllers(&mut self) -> &mut ControllerRegistry {
        Arc::make_mut(&mut self.controllers)
    }

    /// Registers a controller factory under its fully-qualified name.
    pub fn register_controller<C, F>(&mut self, class: &str, factory: F) -> ControllerBuilder<'_, C>
    where
        C: Send + 'static,
        F: Fn(ControllerContext) -> C + Send + Sync + 'static,
    {
        self.controllers().register(class, factory)
    }

    /// Adds a value to the shared state reachable from controllers.
    pub fn state<T>(&mut self, value: T) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.state.insert(value);
        self
    }

    pub fn hook<F>(&mut self, hook: Hook, callback: F) -> &mut Self
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        self.hook_with_priority(hook, DEFAULT_PRIORITY, callback)
    }

    /// Lower priorities run first.
    pub fn hook_with_priority<F>(&mut self, hook: Hook, priority: i32, callback: F) -> &mut Self
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        self.hooks.add(hook, priority, callback);
        self
    }

    /// Sets the handler run when no matched route handles a request.
    pub fn not_found<F, Fut, O>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = ServerResult<O>> + Send + 'static,
        O: IntoOutcome,
    {
        self.not_found = Some(Box::new(handler));
        self
    }

    pub fn on_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(ServerError) -> Response + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Adds middleware that wraps every route.
    pub fn middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.router.middleware(middleware);
        self
    }

    /// Registers a route without HTTP methods; see [`Route::via`].
    pub fn map(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        self.router.map(pattern, target)
    }

    /// Registers a GET (and HEAD) route.
    ///
    /// # Arguments
    /// * `pattern` - The URL pattern to match
    /// * `target` - A `"Controller:action"` string or a handler
    pub fn get(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        self.router.get(pattern, target)
    }

    /// Registers a POST route.
    pub fn post(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        self.router.post(pattern, target)
    }

    /// Registers a PUT route.
    pub fn put(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        self.router.put(pattern, target)
    }

    /// Registers a PATCH route.
    pub fn patch(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        self.router.patch(pattern, target)
    }

    /// Registers a DELETE route.
    pub fn delete(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        self.router.delete(pattern, target)
    }

    /// Registers an OPTIONS route.
    pub fn options(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        self.router.options(pattern, target)
    }

    /// Registers a route for every HTTP method.
    pub fn any(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        self.router.any(pattern, target)
    }

    pub fn group(&mut self, pattern: &str) -> Group<'_> {
        self.router.group(pattern)
    }

    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        self.router.url_for(name, params)
    }

    /// Joins `url` onto the application root; see [`Router::url_for_base`].
    pub fn url_for_base(&self, url: &str) -> String {
        self.router.url_for_base(url)
    }

    pub fn context(&self) -> AppContext {
        AppContext {
            not_found: self.not_found.clone(),
            on_error: self.on_error.clone(),
            ..AppContext::new(
                self.settings.clone(),
                self.controllers.clone(),
                self.state.clone(),
            )
        }
    }

    /// Dispatches a request and turns any error, or a panic inside a
    /// handler, into an error response.
    pub async fn handle(&self, req: Request) -> Response {
        let response = AssertUnwindSafe(self.dispatch(req)).catch_unwind().await;
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                let panic_msg = if let Some(msg) = err.downcast_ref::<&str>() {
                    msg.to_string()
                } else if let Some(msg) = err.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "Unknown panic".to_string()
                };
                Err(ServerError::PanicError(panic_msg))
            }
        };
        match response {
            Ok(response) => response,
            Err(err) => self.handle_error(err),
        }
    }

    /// Runs the full dispatch cycle for one request.
    ///
    /// Errors returned by handlers abort the cycle and are returned as-is;
    /// [`Outcome::Pass`] and [`Outcome::Stop`] are not errors.
    pub async fn dispatch(&self, mut req: Request) -> ServerResult<Response> {
        req.context = self.context();
        self.hooks.apply(Hook::Before, &req);
        let response = match self.route(&req).await? {
            Dispatched::Complete(response) => {
                self.hooks.apply(Hook::AfterRouter, &req);
                response
            }
            Dispatched::Stopped(response) => {
                tracing::debug!(method = %req.method, path = %req.path, "Dispatch stopped");
                response
            }
        };
        self.hooks.apply(Hook::After, &req);
        Ok(response)
    }

    async fn route(&self, req: &Request) -> ServerResult<Dispatched> {
        self.hooks.apply(Hook::BeforeRouter, req);

        for candidate in self.router.matched_routes(req.method, &req.path) {
            self.hooks.apply(Hook::BeforeDispatch, req);
            let outcome = candidate
                .route
                .dispatch(req.with_route_params(candidate.params), &self.router.middlewares)
                .await?;
            match outcome {
                Outcome::Handled(response) => {
                    self.hooks.apply(Hook::AfterDispatch, req);
                    return Ok(Dispatched::Complete(response));
                }
                Outcome::Pass => {
                    tracing::debug!(pattern = %candidate.route.pattern(), "Route passed");
                }
                Outcome::Stop(response) => return Ok(Dispatched::Stopped(response)),
            }
        }

        tracing::debug!(method = %req.method, path = %req.path, "No route handled the request");
        let outcome = match &self.not_found {
            Some(handler) => handler.handle(req.clone()).await?,
            None => Outcome::Pass,
        };
        Ok(match outcome {
            Outcome::Handled(response) => Dispatched::Complete(response),
            Outcome::Stop(response) => Dispatched::Stopped(response),
            Outcome::Pass => Dispatched::Complete(Response::error(ServerError::NotFound)),
        })
    }

    fn handle_error(&self, error: ServerError) -> Response {
        self.context().error_response(error)
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}
