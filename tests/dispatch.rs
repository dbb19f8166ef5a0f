use controller_router::controller::ControllerContext;
use controller_router::error::{ServerError, ServerResult};
use controller_router::handler::Outcome;
use controller_router::http::{Method, Request, Response};
use controller_router::router::RouteTarget;
use controller_router::{json, Application, Settings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Greeting(&'static str);

struct GreeterController {
    greeting: String,
    punctuation: String,
}

impl GreeterController {
    fn new(ctx: ControllerContext) -> Self {
        Self {
            greeting: ctx
                .state::<Greeting>()
                .map_or("Hello", |greeting| greeting.0)
                .to_string(),
            punctuation: ctx
                .params()
                .first()
                .and_then(|value| value.as_str())
                .unwrap_or("!")
                .to_string(),
        }
    }

    async fn hi(self, req: Request) -> ServerResult<Response> {
        Ok(Response::text(format!(
            "{}, {}{}",
            self.greeting,
            req.args()[0],
            self.punctuation
        )))
    }

    async fn index(self, _req: Request) -> ServerResult<Response> {
        Ok(Response::text("greeter index"))
    }

    async fn shy(self, _req: Request) -> ServerResult<Outcome> {
        Ok(Outcome::Pass)
    }
}

struct UsersController;

impl UsersController {
    async fn list_action(self, _req: Request) -> ServerResult<Response> {
        Response::ok(&json!({ "users": ["ann", "bob"] }))
    }
}

fn app() -> Application {
    let settings = Settings::from_toml_str(
        r#"
        [controller]
        prefix = "\\App\\"
        suffix = "Controller"
        "#,
    )
    .unwrap();
    let mut app = Application::with_settings(settings);
    app.state(Greeting("Hello"));
    app.register_controller(r"\App\GreeterController", GreeterController::new)
        .action("hi", GreeterController::hi)
        .action("index", GreeterController::index)
        .action("shy", GreeterController::shy);
    app.register_controller(r"\App\Admin\UsersController", |_ctx| UsersController)
        .action("list", UsersController::list_action);
    app
}

#[tokio::test]
async fn resolves_string_targets_to_controller_actions() {
    let mut app = app();
    app.get("/hello/:name", "Greeter:hi").unwrap();

    let response = app.handle(Request::new(Method::GET, "/hello/world")).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "Hello, world!");

    let head = app.handle(Request::new(Method::HEAD, "/hello/world")).await;
    assert_eq!(head.status, 200);
}

#[tokio::test]
async fn default_action_and_dotted_namespaces() {
    let mut app = app();
    app.get("/greeter", "Greeter").unwrap();
    app.get("/admin/users", "Admin.Users:list").unwrap();

    let response = app.handle(Request::new(Method::GET, "/greeter")).await;
    assert_eq!(response.body, "greeter index");

    let response = app.handle(Request::new(Method::GET, "/admin/users")).await;
    assert_eq!(response.body, r#"{"users":["ann","bob"]}"#);
}

#[tokio::test]
async fn absolute_targets_ignore_the_prefix() {
    let mut app = app();
    app.register_controller(r"\PlainController", |_ctx| UsersController)
        .action("list", UsersController::list_action);
    app.get("/plain", r"\Plain:list").unwrap();

    let response = app.handle(Request::new(Method::GET, "/plain")).await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn constructor_arguments_reach_the_controller() {
    let mut app = app();
    app.get(
        "/excited/:name",
        RouteTarget::controller_with_args("Greeter:hi", vec![json!("!!!")]),
    )
    .unwrap();

    let response = app.handle(Request::new(Method::GET, "/excited/ann")).await;
    assert_eq!(response.body, "Hello, ann!!!");
}

#[tokio::test]
async fn controller_actions_can_pass() {
    let mut app = app();
    app.get("/hello/:name", "Greeter:shy").unwrap();
    app.get("/hello/:name", "Greeter:hi").unwrap();

    let response = app.handle(Request::new(Method::GET, "/hello/bob")).await;
    assert_eq!(response.body, "Hello, bob!");
}

#[tokio::test]
async fn unknown_controllers_fail_at_request_time() {
    let mut app = app();
    // registration succeeds: existence is only checked when the route runs
    app.get("/ghost", "Ghost:boo").unwrap();
    app.get("/typo", "Greeter:hii").unwrap();

    let err = app.dispatch(Request::new(Method::GET, "/ghost")).await.unwrap_err();
    assert!(matches!(err, ServerError::Resolution(_)));

    let response = app.handle(Request::new(Method::GET, "/typo")).await;
    assert_eq!(response.status, 500);
}

#[tokio::test]
async fn malformed_targets_fail_at_registration() {
    let mut app = app();
    assert!(app.get("/bad", "").is_err());
    assert!(app.get("/bad", ":index").is_err());
    assert!(app.router().routes().is_empty());
}

#[tokio::test]
async fn controllers_are_built_per_request() {
    static BUILT: AtomicUsize = AtomicUsize::new(0);

    struct CountingController;

    impl CountingController {
        async fn index(self, _req: Request) -> ServerResult<Response> {
            Ok(Response::text(BUILT.load(Ordering::SeqCst).to_string()))
        }
    }

    let mut app = Application::new();
    app.register_controller("CountingController", |_ctx| {
        BUILT.fetch_add(1, Ordering::SeqCst);
        CountingController
    })
    .action("index", CountingController::index);
    app.get("/count", "CountingController").unwrap();
    assert_eq!(BUILT.load(Ordering::SeqCst), 0);

    for expected in 1..=3 {
        let response = app.handle(Request::new(Method::GET, "/count")).await;
        assert_eq!(response.body, expected.to_string());
    }
}

#[tokio::test]
async fn groups_compose_with_controllers_and_names() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let mut app = app();
    app.group("/api")
        .middleware(controller_router::middleware::from_fn(
            move |req: Request, next: controller_router::middleware::Next| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    next.handle(req).await
                }
            },
        ))
        .routes(|api| {
            api.get("/hello/:name", "Greeter:hi")?.name("api.hello");
            Ok(())
        })
        .unwrap();

    assert_eq!(
        app.url_for("api.hello", &[("name", "zoe")]).unwrap(),
        "/api/hello/zoe"
    );
    let response = app.handle(Request::new(Method::GET, "/api/hello/zoe")).await;
    assert_eq!(response.body, "Hello, zoe!");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let response = app.handle(Request::new(Method::GET, "/hello/zoe")).await;
    assert_eq!(response.status, 404);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

struct PagesController;

impl PagesController {
    async fn about(self, req: Request) -> ServerResult<Response> {
        Ok(Response::text(format!("about {}", req.args().join(","))))
    }
}

fn pages_app() -> Application {
    let mut app = app();
    app.register_controller(r"\App\PagesController", |_ctx| PagesController)
        .action("about", PagesController::about);
    app.not_found(|_req: Request| async {
        let mut response = Response::text("nothing here");
        response.status(404);
        Ok(response)
    });
    app.on_error(|err| {
        let mut response = Response::text(format!("oops: {}", err));
        response.status(err.status_code());
        response
    });
    app.get("/pages", "Pages").unwrap();
    app.get("/pages/:section(/:extra)", "Pages:section").unwrap();
    app.get("/broken", "Pages:errorAction").unwrap();
    app
}

#[tokio::test]
async fn sections_dispatch_to_actions_of_the_same_controller() {
    let app = pages_app();

    let response = app.handle(Request::new(Method::GET, "/pages/about")).await;
    assert_eq!(response.body, "about ");

    let response = app.handle(Request::new(Method::GET, "/pages/about/team")).await;
    assert_eq!(response.body, "about team");

    let response = app.handle(Request::new(Method::GET, "/pages/missing")).await;
    assert_eq!(response.status, 404);
    assert_eq!(response.body, "nothing here");
}

#[tokio::test]
async fn base_index_uses_the_not_found_handler_and_halts() {
    let after_router = Arc::new(AtomicUsize::new(0));
    let counter = after_router.clone();
    let mut app = pages_app();
    app.hook(controller_router::hooks::Hook::AfterRouter, move |_req| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let response = app.handle(Request::new(Method::GET, "/pages")).await;
    assert_eq!(response.status, 404);
    assert_eq!(response.body, "nothing here");
    assert_eq!(after_router.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn base_error_action_uses_the_error_handler() {
    let app = pages_app();
    let response = app.handle(Request::new(Method::GET, "/broken")).await;
    assert_eq!(response.status, 500);
    assert!(response.body.starts_with("oops: "));
}

#[tokio::test]
async fn base_urls_follow_the_base_route() {
    let mut app = Application::with_settings(Settings::default().base_url("/blog/"));
    assert_eq!(app.url_for_base("/posts"), "/blog/posts");

    app.get(
        "/site/",
        controller_router::handler::from_fn(|_req: Request| async {
            Ok(Response::text("home"))
        }),
    )
    .unwrap()
    .name("base");
    assert_eq!(app.url_for_base("/posts//1"), "/site/posts/1");
}
