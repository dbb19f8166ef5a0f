use controller_router::controller::ControllerContext;
use controller_router::error::{ServerError, ServerResult};
use controller_router::handler::{from_fn, Outcome};
use controller_router::hooks::Hook;
use controller_router::http::{Method, Request, Response};
use controller_router::middleware::{self, Next};
use controller_router::{json, Application, Settings};

struct GreeterController {
    greeting: String,
}

impl GreeterController {
    fn new(ctx: ControllerContext) -> Self {
        Self {
            greeting: ctx
                .params()
                .first()
                .and_then(|value| value.as_str())
                .unwrap_or("Hello")
                .to_string(),
        }
    }

    async fn index(self, _req: Request) -> ServerResult<Response> {
        Ok(Response::text(format!("{}, stranger", self.greeting)))
    }

    async fn hi(self, req: Request) -> ServerResult<Outcome> {
        match req.param("name") {
            Some("admin") => Ok(Outcome::Pass),
            Some(name) => Ok(Outcome::Handled(Response::text(format!(
                "{}, {}",
                self.greeting, name
            )))),
            None => Ok(Outcome::Pass),
        }
    }
}

struct UsersController;

impl UsersController {
    async fn show(self, req: Request) -> ServerResult<Response> {
        Response::ok(&json!({ "id": req.param("id") }))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::default()
        .controller_prefix("\\Demo\\")
        .controller_suffix("Controller");
    let mut app = Application::with_settings(settings);

    app.register_controller("\\Demo\\GreeterController", GreeterController::new)
        .action("index", GreeterController::index)
        .action("hi", GreeterController::hi);
    app.register_controller("\\Demo\\Api\\UsersController", |_ctx| UsersController)
        .action("show", UsersController::show);

    app.hook(Hook::Before, |req| println!("--> {} {}", req.method, req.path));
    app.hook(Hook::After, |req| println!("<-- {} {}", req.method, req.path));

    app.get("/", "Greeter")?;
    app.get("/hello/:name", "Greeter:hi")?.name("hello");
    app.get("/hello/admin", from_fn(|_req: Request| async {
        Ok(Response::text("Welcome back, administrator"))
    }))?;

    app.group("/api")
        .middleware(middleware::from_fn(|req: Request, next: Next| async move {
            let outcome = match next.handle(req).await? {
                Outcome::Handled(mut response) => {
                    response.header("X-Api", "1");
                    Outcome::Handled(response)
                }
                other => other,
            };
            Ok::<_, ServerError>(outcome)
        }))
        .routes(|api| {
            api.get("/users/:id", "Api.Users:show")?
                .conditions([("id", r"\d+")])?
                .name("user");
            Ok(())
        })?;

    println!("url_for(hello) = {}", app.url_for("hello", &[("name", "ann")])?);
    println!("url_for(user) = {}", app.url_for("user", &[("id", "7")])?);

    for (method, target) in [
        (Method::GET, "/"),
        (Method::GET, "/hello/ann"),
        (Method::GET, "/hello/admin"),
        (Method::GET, "/api/users/7"),
        (Method::GET, "/api/users/seven"),
        (Method::POST, "/hello/ann"),
    ] {
        let response = app.handle(Request::new(method, target)).await;
        println!("{} {}\n", response.status, response.body);
    }

    Ok(())
}
