//! Minimal allium example — a composed pipeline behind the bundled server.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl 'http://localhost:3000/greet?name=alice'
//!   curl -b name=bob http://localhost:3000/greet
//!   curl http://localhost:3000/admin/boom
//!   curl http://localhost:3000/healthz

use allium::{before, bound, health, middleware, BoundArg, Composer, Context, ParamSpec, Router, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut app = Composer::new();

    // Outermost: recovery first, then one log line per request.
    app.wrap(middleware::recovery());
    app.wrap(middleware::trace());

    app.get("/users/{id}", get_user);
    app.get("/greet", bound(vec![ParamSpec::text("name")], greet));
    app.get("/healthz", health::liveness);
    app.get("/readyz", health::readiness);

    app.scope("/admin", |admin| {
        admin.wrap(before(|mut ctx: Context| async move {
            ctx.insert_header("cache-control", "no-store");
            ctx
        }));
        admin.get("/boom", boom);
    });

    let router = Router::mount(app.build());
    Server::bind("0.0.0.0:3000")
        .serve(router)
        .await
        .expect("server error");
}

// GET /users/{id} — the canonical shape: the context carries everything.
async fn get_user(mut ctx: Context) -> Context {
    let id = ctx.request().param("id").unwrap_or("unknown").to_owned();
    ctx.insert_header("content-type", "application/json");
    ctx.write(format!(r#"{{"id":"{id}","name":"alice"}}"#));
    ctx
}

// GET /greet — a bound shape: `name` resolves from the query string, a form
// body, or a cookie, in that order.
async fn greet(mut ctx: Context, args: Vec<BoundArg>) -> Context {
    let name = args[0].as_text().unwrap_or("stranger").to_owned();
    ctx.write(format!("hello, {name}"));
    ctx
}

// GET /admin/boom — the recovery link turns this into a 500.
async fn boom(_ctx: Context) -> Context {
    panic!("kaboom")
}
