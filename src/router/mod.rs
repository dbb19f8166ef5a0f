pub(crate) mod pattern;

use crate::config::Settings;
use crate::controller::NameResolver;
use crate::error::RouteError;
use crate::handler::{Handler, RouteFuture};
use crate::http::{Method, Request};
use crate::middleware::{Middleware, MiddlewareChain};
use pattern::Pattern;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What a route runs once it matches.
pub enum RouteTarget {
    /// Already invocable; used as-is.
    Handler(Box<dyn Handler>),
    /// A `"Controller:action"` string plus constructor arguments for the
    /// controller.
    Controller { spec: String, args: Vec<Value> },
}

impl RouteTarget {
    pub fn controller(spec: impl Into<String>) -> Self {
        Self::controller_with_args(spec, Vec::new())
    }

    pub fn controller_with_args(spec: impl Into<String>, args: Vec<Value>) -> Self {
        RouteTarget::Controller {
            spec: spec.into(),
            args,
        }
    }
}

impl From<&str> for RouteTarget {
    fn from(spec: &str) -> Self {
        RouteTarget::controller(spec)
    }
}

impl From<String> for RouteTarget {
    fn from(spec: String) -> Self {
        RouteTarget::controller(spec)
    }
}

impl From<Box<dyn Handler>> for RouteTarget {
    fn from(handler: Box<dyn Handler>) -> Self {
        RouteTarget::Handler(handler)
    }
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Handler(_) => f.write_str("Handler(..)"),
            RouteTarget::Controller { spec, args } => f
                .debug_struct("Controller")
                .field("spec", spec)
                .field("args", args)
                .finish(),
        }
    }
}

/// A registered route. Returned by the registration methods for further
/// configuration.
#[derive(Clone)]
pub struct Route {
    pattern: Pattern,
    name: Option<String>,
    methods: Vec<Method>,
    any: bool,
    case_sensitive: bool,
    conditions: HashMap<String, String>,
    middlewares: MiddlewareChain,
    handler: Box<dyn Handler>,
}

impl Route {
    fn new(
        pattern: &str,
        handler: Box<dyn Handler>,
        case_sensitive: bool,
        middlewares: MiddlewareChain,
    ) -> Result<Self, RouteError> {
        let conditions = HashMap::new();
        Ok(Self {
            pattern: Pattern::compile(pattern, case_sensitive, &conditions)?,
            name: None,
            methods: Vec::new(),
            any: false,
            case_sensitive,
            conditions,
            middlewares,
            handler,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.source()
    }

    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn is_any(&self) -> bool {
        self.any
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Adds HTTP methods this route answers to.
    pub fn via(&mut self, methods: &[Method]) -> &mut Self {
        for method in methods {
            if !self.methods.contains(method) {
                self.methods.push(*method);
            }
        }
        self
    }

    pub fn via_any(&mut self) -> &mut Self {
        self.any = true;
        self
    }

    /// Constrains parameters with regular expressions, e.g. `("id", r"\d+")`.
    pub fn conditions<'c>(
        &mut self,
        conditions: impl IntoIterator<Item = (&'c str, &'c str)>,
    ) -> Result<&mut Self, RouteError> {
        let mut merged = self.conditions.clone();
        merged.extend(
            conditions
                .into_iter()
                .map(|(param, regex)| (param.to_string(), regex.to_string())),
        );
        self.pattern = Pattern::compile(self.pattern.source(), self.case_sensitive, &merged)?;
        self.conditions = merged;
        Ok(self)
    }

    /// Appends route middleware; it runs after any group middleware.
    pub fn middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    pub fn supports_method(&self, method: Method) -> bool {
        self.any || self.methods.contains(&method)
    }

    pub(crate) fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        self.pattern.matches(path)
    }

    /// Runs `outer` then this route's middleware, then the target.
    pub(crate) fn dispatch(&self, req: Request, outer: &MiddlewareChain) -> RouteFuture {
        let mut chain = outer.clone();
        chain.extend(&self.middlewares);
        chain.run(req, self.handler.clone())
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern())
            .field("name", &self.name)
            .field("methods", &self.methods)
            .field("any", &self.any)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// A route whose pattern and method matched a request.
pub struct MatchedRoute<'a> {
    pub route: &'a Route,
    pub params: Vec<(String, String)>,
}

/// Registration façade over the route table.
///
/// Targets may be closures (see [`handler::from_fn`](crate::handler::from_fn))
/// or `"Controller:action"` strings, which are resolved here, at
/// registration, using the controller naming settings.
#[derive(Clone)]
pub struct Router {
    settings: Arc<Settings>,
    resolver: NameResolver,
    routes: Vec<Route>,
    groups: Vec<(String, MiddlewareChain)>,
    pub(crate) middlewares: MiddlewareChain,
}

impl Router {
    pub fn new() -> Self {
        Self::with_settings(Arc::new(Settings::default()))
    }

    pub fn with_settings(settings: Arc<Settings>) -> Self {
        Self {
            resolver: NameResolver::new(settings.controller.clone()),
            settings,
            routes: Vec::new(),
            groups: Vec::new(),
            middlewares: MiddlewareChain::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    /// Turns a route target into something invocable.
    pub fn create_controller(
        &self,
        target: impl Into<RouteTarget>,
    ) -> Result<Box<dyn Handler>, RouteError> {
        match target.into() {
            RouteTarget::Handler(handler) => Ok(handler),
            RouteTarget::Controller { spec, args } => {
                Ok(Box::new(self.resolver.resolve(&spec, args)?))
            }
        }
    }

    /// Adds a route without any HTTP method; call [`Route::via`] on the result.
    pub fn map(
        &mut self,
        pattern: &str,
        target: impl Into<RouteTarget>,
    ) -> Result<&mut Route, RouteError> {
        let handler = self.create_controller(target)?;

        let mut full_pattern: String = self.groups.iter().map(|(prefix, _)| prefix.as_str()).collect();
        full_pattern.push_str(pattern);
        let full_pattern = full_pattern.trim_end_matches('/');
        let full_pattern = if full_pattern.is_empty() { "/" } else { full_pattern };

        let mut middlewares = MiddlewareChain::new();
        for (_, group_middlewares) in &self.groups {
            middlewares.extend(group_middlewares);
        }

        let route = Route::new(full_pattern, handler, self.settings.case_sensitive, middlewares)?;
        tracing::trace!(pattern = %route.pattern(), "Route registered");
        self.routes.push(route);
        let index = self.routes.len() - 1;
        Ok(&mut self.routes[index])
    }

    /// Adds a GET route, which also answers HEAD.
    pub fn get(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        Ok(self.map(pattern, target)?.via(&[Method::GET, Method::HEAD]))
    }

    pub fn post(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        Ok(self.map(pattern, target)?.via(&[Method::POST]))
    }

    pub fn put(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        Ok(self.map(pattern, target)?.via(&[Method::PUT]))
    }

    pub fn patch(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        Ok(self.map(pattern, target)?.via(&[Method::PATCH]))
    }

    pub fn delete(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        Ok(self.map(pattern, target)?.via(&[Method::DELETE]))
    }

    pub fn options(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        Ok(self.map(pattern, target)?.via(&[Method::OPTIONS]))
    }

    /// Adds a route answering every HTTP method.
    pub fn any(&mut self, pattern: &str, target: impl Into<RouteTarget>) -> Result<&mut Route, RouteError> {
        Ok(self.map(pattern, target)?.via_any())
    }

    /// Starts a route group. Routes registered inside
    /// [`Group::routes`] get the group's pattern as a prefix and its
    /// middleware ahead of their own.
    pub fn group(&mut self, pattern: &str) -> Group<'_> {
        Group {
            router: self,
            pattern: pattern.to_string(),
            middlewares: MiddlewareChain::new(),
        }
    }

    /// Adds application-level middleware, run outside every route's own chain.
    pub fn middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Routes matching `method` and `path`, in registration order.
    pub fn matched_routes(&self, method: Method, path: &str) -> Vec<MatchedRoute<'_>> {
        self.routes
            .iter()
            .filter(|route| route.supports_method(method))
            .filter_map(|route| {
                route
                    .matches(path)
                    .map(|params| MatchedRoute { route, params })
            })
            .collect()
    }

    pub fn has_named_route(&self, name: &str) -> bool {
        self.named_route(name).is_some()
    }

    pub fn named_route(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.route_name() == Some(name))
    }

    /// Builds the URL of a named route.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let route = self
            .named_route(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;
        let params = params
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Ok(pattern::build_url(route.pattern(), &params))
    }

    /// Joins `url` onto the application root: the route named `base` if
    /// there is one, otherwise the `base_url` setting.
    pub fn url_for_base(&self, url: &str) -> String {
        let base = match self.named_route("base") {
            Some(route) => pattern::build_url(route.pattern(), &HashMap::new()),
            None => self.settings.base_url.clone(),
        };
        pattern::collapse_slashes(&format!("{}{}", base, url))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Group<'a> {
    router: &'a mut Router,
    pattern: String,
    middlewares: MiddlewareChain,
}

impl<'a> Group<'a> {
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// Registers the group's routes. The group scope is popped even when
    /// `f` fails.
    pub fn routes<F>(self, f: F) -> Result<(), RouteError>
    where
        F: FnOnce(&mut Router) -> Result<(), RouteError>,
    {
        let Group {
            router,
            pattern,
            middlewares,
        } = self;
        router.groups.push((pattern, middlewares));
        let result = f(router);
        router.groups.pop();
        result
    }
}
