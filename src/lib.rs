//! # allium
//!
//! Onion-style middleware composition for HTTP services. Declare routes and
//! cross-cutting middleware independently; build the chains once at startup.
//!
//! ## The contract
//!
//! Middleware applicability is **static**. Every middleware registration
//! carries a filter over the route descriptor — its scope prefix, a method
//! constraint, an arbitrary predicate — and the filters run exactly once,
//! when [`Composer::build`] assembles the chains. A route that a middleware
//! does not apply to never pays for it: the link simply is not in that
//! route's chain. Requests execute pre-built call graphs; nothing is
//! filtered, matched, or re-composed per request.
//!
//! Inside a chain, each layer may write to the response, refuse to descend
//! (short-circuit), substitute the response sink or the request for every
//! layer below it, and run post-logic while the chain unwinds — classic
//! onion semantics.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use allium::{before, middleware, Composer, Context, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = Composer::new();
//!     app.wrap(middleware::recovery());
//!     app.wrap(middleware::trace());
//!     app.get("/users/{id}", get_user);
//!
//!     app.scope("/admin", |admin| {
//!         admin.wrap(before(|mut ctx: Context| async move {
//!             ctx.insert_header("cache-control", "no-store");
//!             ctx
//!         }));
//!         admin.get("/stats", stats);
//!     });
//!
//!     let router = Router::mount(app.build());
//!     Server::bind("0.0.0.0:3000").serve(router).await.unwrap();
//! }
//!
//! async fn get_user(mut ctx: Context) -> Context {
//!     let id = ctx.request().param("id").unwrap_or("unknown").to_owned();
//!     ctx.insert_header("content-type", "application/json");
//!     ctx.write(format!(r#"{{"id":"{id}"}}"#));
//!     ctx
//! }
//!
//! async fn stats(mut ctx: Context) -> Context {
//!     ctx.write("{}");
//!     ctx
//! }
//! ```
//!
//! The bundled [`Router`] and [`Server`] are conveniences, not requirements:
//! [`Composer::build`] returns a plain list of `(method, pattern, chain)`
//! [`Route`]s that any URL-matching transport can mount and drive through
//! [`Route::invoke`].

mod binder;
mod chain;
mod composer;
mod context;
mod error;
mod handler;
mod registry;
mod request;
mod response;
mod router;
mod server;

pub mod health;
pub mod middleware;

pub use binder::{BindError, BindSource, BindValue, Binder, BoundArg, ParamKind, ParamSpec};
pub use chain::{before, chain_fn, BoxFuture, Chain, ChainHandler, ChainLink, Route};
pub use composer::{Composer, MiddlewareHandle, RouteHandle, Scope};
pub use context::{Context, PayloadFactory};
pub use error::Error;
pub use handler::{bound, nullary, with_text, Handler};
pub use registry::{
    MiddlewareEntry, MiddlewareRegistry, RouteDescriptor, RouteFilter, RouteInfo, RouteRegistry,
};
pub use request::Request;
pub use response::{Response, ResponseBuffer, ResponseSink};
pub use router::Router;
pub use server::Server;

// Re-exported so applications do not need a direct `http` dependency for the
// two types the API surfaces everywhere.
pub use http::{Method, StatusCode};
