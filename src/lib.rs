//! # controller-router
//!
//! Controller dispatch and route registration for small web applications.
//!
//! ## Features
//!
//! - `"Controller:action"` route targets, resolved with configurable
//!   class and action prefixes/suffixes
//! - A fresh controller instance per request
//! - Verb helpers (`get`, `post`, `put`, `patch`, `delete`, `options`,
//!   `any`, `map`) and nested route groups with middleware
//! - A dispatch loop where a route may pass the request on to the next
//!   matching route, or stop the cycle with a final response
//! - Lifecycle hooks around routing and dispatch
//!
//! ## Quick Start
//!
//! ```rust
//! use controller_router::app::Application;
//! use controller_router::handler::from_fn;
//! use controller_router::http::{Method, Request, Response};
//!
//! # futures::executor::block_on(async {
//! let mut app = Application::new();
//! app.get("/", from_fn(|_req: Request| async {
//!     Ok(Response::text("Hello, World!"))
//! }))
//! .unwrap();
//!
//! let response = app.handle(Request::new(Method::GET, "/")).await;
//! assert_eq!(response.body, "Hello, World!");
//! # });
//! ```
//!
//! ## Passing
//!
//! ```rust
//! use controller_router::app::Application;
//! use controller_router::handler::{from_fn, Outcome};
//! use controller_router::http::{Method, Request, Response};
//!
//! # futures::executor::block_on(async {
//! let mut app = Application::new();
//! app.get("/users/:id", from_fn(|req: Request| async move {
//!     if req.param("id") == Some("me") {
//!         return Ok(Outcome::Pass);
//!     }
//!     Ok(Outcome::Handled(Response::text("by id")))
//! }))
//! .unwrap();
//! app.get("/users/me", from_fn(|_req: Request| async {
//!     Ok(Response::text("current user"))
//! }))
//! .unwrap();
//!
//! let response = app.handle(Request::new(Method::GET, "/users/me")).await;
//! assert_eq!(response.body, "current user");
//! # });
//! ```

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod handler;
pub mod hooks;
pub mod http;
pub mod middleware;
pub mod router;
pub mod state;
pub extern crate serde_json;

pub use serde_json::{json, Value};

pub use app::{AppContext, Application};
pub use config::Settings;
pub use error::{RouteError, ServerError};
pub use handler::Outcome;
pub use http::{Method, Request, Response};
pub use router::{Route, RouteTarget, Router};
