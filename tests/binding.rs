//! Dynamically bound handlers: source priority, typed conversion, custom
//! sources, fast-path equivalence, and fail-fast behavior.

use allium::{
    bound, nullary, with_text, BindSource, BindValue, BoundArg, Composer, Context, Method,
    ParamSpec, Request, Response, Route,
};

fn body(response: &Response) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}

async fn respond(route: &Route, request: Request) -> String {
    body(&route.respond(request).await)
}

async fn echo_name(mut ctx: Context, name: String) -> Context {
    ctx.write(name);
    ctx
}

// ── Source priority ──────────────────────────────────────────────────────────

#[tokio::test]
async fn query_string_beats_cookie() {
    let mut app = Composer::new();
    app.get("/greet", with_text("name", echo_name));
    let routes = app.build();

    let request = Request::new(Method::GET, "/greet?name=from-query")
        .with_header("cookie", "name=from-cookie");
    assert_eq!(respond(&routes[0], request).await, "from-query");
}

#[tokio::test]
async fn cookie_is_used_when_nothing_else_matches() {
    let mut app = Composer::new();
    app.get("/greet", with_text("name", echo_name));
    let routes = app.build();

    let request = Request::new(Method::GET, "/greet").with_header("cookie", "name=from-cookie");
    assert_eq!(respond(&routes[0], request).await, "from-cookie");
}

#[tokio::test]
async fn form_body_values_resolve_like_query_values() {
    let mut app = Composer::new();
    app.post("/greet", with_text("name", echo_name));
    let routes = app.build();

    let request = Request::new(Method::POST, "/greet")
        .with_header("content-type", "application/x-www-form-urlencoded")
        .with_body("name=from+form");
    assert_eq!(respond(&routes[0], request).await, "from form");
}

#[tokio::test]
async fn router_extracted_arguments_resolve_by_name() {
    let mut app = Composer::new();
    app.get(
        "/users/{id}",
        bound(vec![ParamSpec::int("id")], |mut ctx: Context, args: Vec<BoundArg>| async move {
            let id = args[0].as_int().unwrap_or(-1);
            ctx.write(format!("user {id}"));
            ctx
        }),
    );
    let routes = app.build();

    // As it arrives from the router after matching `/users/42`.
    let request = Request::new(Method::GET, "/users/42").with_param("id", "42");
    assert_eq!(respond(&routes[0], request).await, "user 42");
}

// ── Typed conversion and multiple parameters ─────────────────────────────────

#[tokio::test]
async fn parameters_bind_in_declaration_order_with_their_declared_kinds() {
    let mut app = Composer::new();
    app.get(
        "/scale",
        bound(
            vec![ParamSpec::text("name"), ParamSpec::int("n"), ParamSpec::float("factor")],
            |mut ctx: Context, args: Vec<BoundArg>| async move {
                let name = args[0].as_text().unwrap_or("?").to_owned();
                let n = args[1].as_int().unwrap_or(0);
                let factor = args[2].as_float().unwrap_or(0.0);
                ctx.write(format!("{name}:{}", n as f64 * factor));
                ctx
            },
        ),
    );
    let routes = app.build();

    let request = Request::new(Method::GET, "/scale?name=load&n=4&factor=2.5");
    assert_eq!(respond(&routes[0], request).await, "load:10");
}

#[tokio::test]
async fn the_request_itself_binds_by_type() {
    let mut app = Composer::new();
    app.get(
        "/where",
        bound(vec![ParamSpec::request("req")], |mut ctx: Context, args: Vec<BoundArg>| async move {
            let path = args[0].as_request().map(|r| r.path().to_owned()).unwrap_or_default();
            ctx.write(path);
            ctx
        }),
    );
    let routes = app.build();

    let request = Request::new(Method::GET, "/where");
    assert_eq!(respond(&routes[0], request).await, "/where");
}

// ── Custom sources ───────────────────────────────────────────────────────────

struct HeaderSource;

impl BindSource for HeaderSource {
    fn name(&self) -> &'static str {
        "header"
    }

    fn resolve(&self, request: &Request, param: &ParamSpec) -> Option<BindValue> {
        request.header(param.name()).map(|v| BindValue::Raw(v.to_owned()))
    }
}

#[tokio::test]
async fn appended_sources_answer_after_the_built_ins() {
    let mut app = Composer::new();
    app.binder_mut().push_source(HeaderSource);
    app.get("/greet", with_text("x-name", echo_name));
    let routes = app.build();

    let request = Request::new(Method::GET, "/greet").with_header("x-name", "from-header");
    assert_eq!(respond(&routes[0], request).await, "from-header");

    // Built-in priority undisturbed: the query still wins over the header.
    let request = Request::new(Method::GET, "/greet?x-name=from-query")
        .with_header("x-name", "from-header");
    assert_eq!(respond(&routes[0], request).await, "from-query");
}

// ── Fast paths ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn with_text_and_bound_produce_identical_behavior() {
    let mut app = Composer::new();
    app.get("/fast", with_text("name", echo_name));
    app.get(
        "/general",
        bound(vec![ParamSpec::text("name")], |mut ctx: Context, args: Vec<BoundArg>| async move {
            let name = args[0].as_text().unwrap_or("?").to_owned();
            ctx.write(name);
            ctx
        }),
    );
    let routes = app.build();

    let fast = respond(&routes[0], Request::new(Method::GET, "/fast?name=same")).await;
    let general = respond(&routes[1], Request::new(Method::GET, "/general?name=same")).await;
    assert_eq!(fast, general);
}

#[tokio::test]
async fn nullary_handlers_run_for_their_side_effects() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let hit = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&hit);

    let mut app = Composer::new();
    app.get(
        "/ping",
        nullary(move || {
            let flag = Arc::clone(&flag);
            async move {
                flag.store(true, Ordering::SeqCst);
            }
        }),
    );
    let routes = app.build();

    let response = routes[0].respond(Request::new(Method::GET, "/ping")).await;
    assert!(hit.load(Ordering::SeqCst));
    assert!(response.body().is_empty());
}

// ── Fail-fast ────────────────────────────────────────────────────────────────

#[tokio::test]
#[should_panic(expected = "no binding source resolved parameter `name`")]
async fn an_unresolvable_parameter_fails_the_invocation() {
    let mut app = Composer::new();
    app.get("/greet", with_text("name", echo_name));
    let routes = app.build();

    routes[0].respond(Request::new(Method::GET, "/greet")).await;
}

#[tokio::test]
#[should_panic(expected = "not a valid int")]
async fn a_conversion_failure_fails_the_invocation() {
    let mut app = Composer::new();
    app.get(
        "/n",
        bound(vec![ParamSpec::int("n")], |ctx: Context, _args: Vec<BoundArg>| async move { ctx }),
    );
    let routes = app.build();

    routes[0].respond(Request::new(Method::GET, "/n?n=forty-two")).await;
}
