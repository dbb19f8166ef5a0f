//! Controllers: objects built fresh for every request whose actions serve
//! as route targets.
//!
//! Controllers are registered by their fully-qualified name together with a
//! factory and a table of actions. Route targets written as
//! `"Controller:action"` are resolved to such a name when the route is
//! registered, and looked up in the registry only when the route runs.
//!
//! Every controller starts out with three actions of its own, which
//! registering an action under the same name replaces:
//!
//! - `index` answers not-found.
//! - `section` runs the action named by the first call-time argument, passing
//!   it the remaining arguments. It answers not-found if there is no such action.
//! - `errorAction` answers through the application's error handler.
//!
//! ```rust
//! use controller_router::controller::{ControllerContext, ControllerRegistry};
//! use controller_router::error::ServerResult;
//! use controller_router::http::{Request, Response};
//!
//! struct GreeterController {
//!     greeting: String,
//! }
//!
//! impl GreeterController {
//!     async fn hi(self, req: Request) -> ServerResult<Response> {
//!         Ok(Response::text(format!("{}, {}", self.greeting, req.args()[0])))
//!     }
//! }
//!
//! let mut controllers = ControllerRegistry::new();
//! controllers
//!     .register("GreeterController", |_ctx: ControllerContext| GreeterController {
//!         greeting: "Hello".to_string(),
//!     })
//!     .action("hi", GreeterController::hi);
//! ```

pub mod resolver;

pub use resolver::{NameResolver, ResolvedName, DEFAULT_ACTION, NAMESPACE_SEPARATOR};

pub const SECTION_ACTION: &str = "section";
pub const ERROR_ACTION: &str = "errorAction";

use crate::app::AppContext;
use crate::config::Settings;
use crate::error::{ResolutionError, ServerError, ServerResult};
use crate::handler::{Handler, IntoOutcome, RouteFuture, RouteResult};
use crate::http::Request;
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type ActionFn = Arc<dyn Fn(ControllerContext, Request) -> RouteFuture + Send + Sync>;

/// What a controller factory receives: the application context and the
/// constructor arguments given when the route target was resolved.
#[derive(Debug, Clone)]
pub struct ControllerContext {
    app: AppContext,
    params: Arc<Vec<Value>>,
}

impl ControllerContext {
    pub(crate) fn new(app: AppContext, params: Arc<Vec<Value>>) -> Self {
        Self { app, params }
    }

    pub fn app(&self) -> &AppContext {
        &self.app
    }

    pub fn settings(&self) -> &Settings {
        self.app.settings()
    }

    pub fn state<T: 'static>(&self) -> Option<&T> {
        self.app.state().get::<T>()
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Maps fully-qualified controller names to their actions.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, HashMap<String, ActionFn>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a controller under `class`. A leading namespace separator
    /// is not significant: `\GreeterController` and `GreeterController`
    /// name the same controller.
    pub fn register<C, F>(&mut self, class: &str, factory: F) -> ControllerBuilder<'_, C>
    where
        C: Send + 'static,
        F: Fn(ControllerContext) -> C + Send + Sync + 'static,
    {
        let class = normalize(class).to_string();
        let actions = self
            .controllers
            .entry(class.clone())
            .or_insert_with(|| base_actions(&class));
        ControllerBuilder {
            class,
            actions,
            factory: Arc::new(factory),
        }
    }

    pub fn contains(&self, class: &str) -> bool {
        self.controllers.contains_key(normalize(class))
    }

    pub fn has_action(&self, class: &str, action: &str) -> bool {
        self.controllers
            .get(normalize(class))
            .is_some_and(|actions| actions.contains_key(action))
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(String::as_str)
    }

    fn action(&self, class: &str, action: &str) -> Result<ActionFn, ResolutionError> {
        let actions = self
            .controllers
            .get(normalize(class))
            .ok_or_else(|| ResolutionError::ControllerNotFound {
                class: class.to_string(),
            })?;
        actions
            .get(action)
            .cloned()
            .ok_or_else(|| ResolutionError::ActionNotFound {
                class: class.to_string(),
                action: action.to_string(),
            })
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (class, actions) in &self.controllers {
            let mut names: Vec<&String> = actions.keys().collect();
            names.sort();
            map.entry(class, &names);
        }
        map.finish()
    }
}

fn normalize(class: &str) -> &str {
    class.trim_start_matches(NAMESPACE_SEPARATOR)
}

fn base_actions(class: &str) -> HashMap<String, ActionFn> {
    HashMap::from([
        (DEFAULT_ACTION.to_string(), not_found_action()),
        (SECTION_ACTION.to_string(), section_action(class.to_string())),
        (ERROR_ACTION.to_string(), error_action()),
    ])
}

fn not_found_action() -> ActionFn {
    Arc::new(|ctx: ControllerContext, req: Request| ctx.app().not_found(req))
}

fn error_action() -> ActionFn {
    Arc::new(|ctx: ControllerContext, _req: Request| -> RouteFuture {
        let error = ServerError::InternalError("Controller error action".to_string());
        let result: RouteResult = Ok(ctx.app().error(error));
        futures::future::ready(result).boxed()
    })
}

fn section_action(class: String) -> ActionFn {
    Arc::new(move |ctx: ControllerContext, mut req: Request| -> RouteFuture {
        if req.args.is_empty() {
            return ctx.app().not_found(req);
        }
        let section = req.args.remove(0);
        let found = ctx.app().controllers().action(&class, &section);
        match found {
            Ok(action) => {
                tracing::debug!(class = %class, section = %section, "Dispatching controller section");
                action(ctx, req)
            }
            Err(err) => {
                tracing::debug!(error = %err, "Unknown controller section");
                ctx.app().not_found(req)
            }
        }
    })
}

pub struct ControllerBuilder<'a, C> {
    class: String,
    actions: &'a mut HashMap<String, ActionFn>,
    factory: Arc<dyn Fn(ControllerContext) -> C + Send + Sync>,
}

impl<C: Send + 'static> ControllerBuilder<'_, C> {
    /// Adds an action. Every call constructs a new controller with the
    /// factory and hands it to `method` by value.
    pub fn action<M, Fut, O>(self, name: &str, method: M) -> Self
    where
        M: Fn(C, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServerResult<O>> + Send + 'static,
        O: IntoOutcome,
    {
        let factory = self.factory.clone();
        let action: ActionFn = Arc::new(move |ctx: ControllerContext, req: Request| -> RouteFuture {
            let controller = factory(ctx);
            method(controller, req)
                .map(|result| result.map(IntoOutcome::into_outcome))
                .boxed()
        });
        self.actions.insert(name.to_string(), action);
        self
    }

    /// Registers `name` as an action that answers not-found, like the
    /// default `index`.
    pub fn not_found_action(self, name: &str) -> Self {
        self.actions.insert(name.to_string(), not_found_action());
        self
    }

    /// Registers `name` as a section dispatcher, like the default `section`.
    pub fn section(self, name: &str) -> Self {
        let action = section_action(self.class.clone());
        self.actions.insert(name.to_string(), action);
        self
    }

    /// Registers `name` as an action that answers through the error
    /// handler, like the default `errorAction`.
    pub fn error_action(self, name: &str) -> Self {
        self.actions.insert(name.to_string(), error_action());
        self
    }
}

/// A route target resolved from a `"Controller:action"` string.
#[derive(Debug, Clone)]
pub struct ControllerHandler {
    class: String,
    action: String,
    args: Arc<Vec<Value>>,
}

impl ControllerHandler {
    pub(crate) fn new(class: String, action: String, args: Vec<Value>) -> Self {
        Self {
            class,
            action,
            args: Arc::new(args),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

impl Handler for ControllerHandler {
    fn handle(&self, req: Request) -> RouteFuture {
        let app = req.context().clone();
        match app.controllers().action(&self.class, &self.action) {
            Ok(action) => {
                tracing::debug!(class = %self.class, action = %self.action, args = ?req.args, "Calling controller action");
                action(ControllerContext::new(app, self.args.clone()), req)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Controller resolution failed");
                let result: RouteResult = Err(err.into());
                futures::future::ready(result).boxed()
            }
        }
    }

    fn dyn_clone(&self) -> Box<dyn Handler> {
        Box::new(self.clone())
    }
}
