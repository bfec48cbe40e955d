//! The registration surface and the build step.

use std::any::Any;
use std::sync::Arc;

use http::Method;

use crate::binder::Binder;
use crate::chain::{compose, Chain, ChainLink, Route};
use crate::context::PayloadFactory;
use crate::handler::Handler;
use crate::registry::{
    MiddlewareEntry, MiddlewareRegistry, RouteDescriptor, RouteFilter, RouteInfo, RouteRegistry,
};

/// Composes routes and cross-cutting middleware into per-route handler
/// chains.
///
/// Declare everything during startup, then call [`build`](Composer::build)
/// once: every stored route gets its applicable middleware — decided by each
/// entry's static filter, in registration order — folded around its terminal
/// handler. Requests run the pre-built chains; nothing is re-evaluated per
/// request.
///
/// ```rust
/// use allium::{before, Composer, Context};
///
/// let mut app = Composer::new();
/// app.wrap(before(|mut ctx: Context| async move {
///     ctx.insert_header("server", "allium");
///     ctx
/// }));
/// app.get("/hello", |mut ctx: Context| async move {
///     ctx.write("hi");
///     ctx
/// });
///
/// let routes = app.build();
/// assert_eq!(routes.len(), 1);
/// ```
pub struct Composer {
    routes: RouteRegistry,
    middleware: MiddlewareRegistry,
    binder: Binder,
    default_payload: Option<PayloadFactory>,
}

impl Composer {
    pub fn new() -> Self {
        Self {
            routes: RouteRegistry::new(),
            middleware: MiddlewareRegistry::new(),
            binder: Binder::new(),
            default_payload: None,
        }
    }

    // ── Routes ───────────────────────────────────────────────────────────────

    /// Registers a route. Duplicates are kept; an external router decides
    /// what to make of them.
    pub fn handle(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> RouteHandle<'_> {
        self.add_route_at("", method, pattern, handler)
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.handle(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.handle(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.handle(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.handle(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.handle(Method::DELETE, pattern, handler)
    }

    // ── Middleware ───────────────────────────────────────────────────────────

    /// Registers middleware for every route.
    pub fn wrap(
        &mut self,
        link: impl Fn(Chain) -> Chain + Send + Sync + 'static,
    ) -> MiddlewareHandle<'_> {
        self.add_middleware_at(String::new(), None, Box::new(link))
    }

    /// Registers middleware constrained to routes of one method.
    ///
    /// The constraint is applied when the chains are built — a filtered-out
    /// route never carries the link, it is not a runtime check.
    pub fn wrap_for(
        &mut self,
        method: Method,
        link: impl Fn(Chain) -> Chain + Send + Sync + 'static,
    ) -> MiddlewareHandle<'_> {
        let constraint: RouteFilter = Box::new(move |route| route.method() == method);
        self.add_middleware_at(String::new(), Some(constraint), Box::new(link))
    }

    /// Registers middleware constrained by an arbitrary predicate over the
    /// route descriptor.
    pub fn wrap_when(
        &mut self,
        constraint: impl Fn(&RouteInfo) -> bool + Send + Sync + 'static,
        link: impl Fn(Chain) -> Chain + Send + Sync + 'static,
    ) -> MiddlewareHandle<'_> {
        self.add_middleware_at(String::new(), Some(Box::new(constraint)), Box::new(link))
    }

    // ── Scoping ──────────────────────────────────────────────────────────────

    /// Opens a sub-scope rooted at `prefix`.
    ///
    /// Routes registered inside get the accumulated prefix prepended to their
    /// pattern; middleware registered inside applies only to routes whose
    /// pattern starts with the accumulated prefix. Scopes nest, and nesting
    /// is additive — an inner scope inherits every outer scope's middleware.
    pub fn scope(&mut self, prefix: &str, f: impl FnOnce(&mut Scope<'_>)) {
        let mut scope = Scope { composer: self, prefix: prefix.to_owned() };
        f(&mut scope);
    }

    // ── Configuration ────────────────────────────────────────────────────────

    /// Default per-request payload factory, inherited by every route without
    /// a more specific override.
    pub fn default_payload<T, F>(&mut self, factory: F)
    where
        T: Send + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default_payload = Some(erase_factory(factory));
    }

    /// The binder used by dynamically bound handlers. Append custom sources
    /// here before building.
    pub fn binder_mut(&mut self) -> &mut Binder {
        &mut self.binder
    }

    // ── Build ────────────────────────────────────────────────────────────────

    /// Builds one composed handler per stored route, in registration order.
    ///
    /// For each route: the middleware registry yields the applicable entries,
    /// the payload precedence is resolved (route override, else the last
    /// applicable middleware override, else the default), and the links fold
    /// around the terminal handler. Non-consuming and deterministic —
    /// building twice from unmutated registries yields chains with identical
    /// behavior.
    pub fn build(&self) -> Vec<Route> {
        let binder = Arc::new(self.binder.clone());
        self.routes
            .iter()
            .map(|descriptor| {
                let entries = self.middleware.applicable_to(descriptor.info());
                let payload = descriptor
                    .payload()
                    .cloned()
                    .or_else(|| entries.iter().rev().find_map(|entry| entry.payload().cloned()))
                    .or_else(|| self.default_payload.clone());
                let chain = compose(Arc::clone(descriptor.endpoint()), &entries);
                Route::new(
                    descriptor.info().method().clone(),
                    descriptor.info().pattern().to_owned(),
                    chain,
                    payload,
                    Arc::clone(&binder),
                )
            })
            .collect()
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn add_route_at(
        &mut self,
        prefix: &str,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> RouteHandle<'_> {
        let pattern = format!("{prefix}{pattern}");
        RouteHandle {
            descriptor: self.routes.add_route(method, pattern, handler.into_chain()),
        }
    }

    fn add_middleware_at(
        &mut self,
        prefix: String,
        constraint: Option<RouteFilter>,
        link: ChainLink,
    ) -> MiddlewareHandle<'_> {
        let filter: RouteFilter = Box::new(move |route: &RouteInfo| {
            let in_scope = prefix.is_empty() || route.pattern().starts_with(&prefix);
            in_scope && constraint.as_ref().is_none_or(|c| c(route))
        });
        MiddlewareHandle { entry: self.middleware.add(filter, link) }
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Scope ────────────────────────────────────────────────────────────────────

/// A path-prefix-bound registration context sharing the root registries.
///
/// Created by [`Composer::scope`]; offers the same registration surface with
/// the accumulated prefix baked into every call.
pub struct Scope<'c> {
    composer: &'c mut Composer,
    prefix: String,
}

impl Scope<'_> {
    pub fn handle(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> RouteHandle<'_> {
        let prefix = self.prefix.clone();
        self.composer.add_route_at(&prefix, method, pattern, handler)
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.handle(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.handle(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.handle(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.handle(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Handler) -> RouteHandle<'_> {
        self.handle(Method::DELETE, pattern, handler)
    }

    /// Registers middleware for every route under this scope's prefix.
    pub fn wrap(
        &mut self,
        link: impl Fn(Chain) -> Chain + Send + Sync + 'static,
    ) -> MiddlewareHandle<'_> {
        self.composer
            .add_middleware_at(self.prefix.clone(), None, Box::new(link))
    }

    /// Like [`Composer::wrap_for`], scoped to this prefix.
    pub fn wrap_for(
        &mut self,
        method: Method,
        link: impl Fn(Chain) -> Chain + Send + Sync + 'static,
    ) -> MiddlewareHandle<'_> {
        let constraint: RouteFilter = Box::new(move |route| route.method() == method);
        self.composer
            .add_middleware_at(self.prefix.clone(), Some(constraint), Box::new(link))
    }

    /// Like [`Composer::wrap_when`], scoped to this prefix.
    pub fn wrap_when(
        &mut self,
        constraint: impl Fn(&RouteInfo) -> bool + Send + Sync + 'static,
        link: impl Fn(Chain) -> Chain + Send + Sync + 'static,
    ) -> MiddlewareHandle<'_> {
        self.composer.add_middleware_at(
            self.prefix.clone(),
            Some(Box::new(constraint)),
            Box::new(link),
        )
    }

    /// Opens a nested scope; prefixes concatenate.
    pub fn scope(&mut self, suffix: &str, f: impl FnOnce(&mut Scope<'_>)) {
        let mut child = Scope {
            composer: &mut *self.composer,
            prefix: format!("{}{}", self.prefix, suffix),
        };
        f(&mut child);
    }
}

// ── Override handles ─────────────────────────────────────────────────────────

/// Returned by route registration; attaches a per-route payload override
/// before the chains are built.
pub struct RouteHandle<'a> {
    descriptor: &'a mut RouteDescriptor,
}

impl RouteHandle<'_> {
    /// Per-route payload factory. Beats every middleware override and the
    /// composer default.
    pub fn payload<T, F>(self, factory: F) -> Self
    where
        T: Send + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.descriptor.set_payload(erase_factory(factory));
        self
    }
}

/// Returned by middleware registration; attaches a payload override before
/// the chains are built.
pub struct MiddlewareHandle<'a> {
    entry: &'a mut MiddlewareEntry,
}

impl MiddlewareHandle<'_> {
    /// Per-middleware payload factory. Among the middleware applicable to a
    /// route, the last registered override wins; a per-route factory beats
    /// them all.
    pub fn payload<T, F>(self, factory: F) -> Self
    where
        T: Send + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.entry.set_payload(erase_factory(factory));
        self
    }
}

fn erase_factory<T, F>(factory: F) -> PayloadFactory
where
    T: Send + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Arc::new(move || Box::new(factory()) as Box<dyn Any + Send>)
}
