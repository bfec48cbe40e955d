//! Route and middleware registries: ordered storage, static filtering.
//!
//! Both registries are append-only during the registration phase and are
//! only read afterwards, when the chains are built. Middleware applicability
//! is decided here, once per route, by evaluating each entry's filter against
//! the route descriptor — never per request.

use http::Method;

use crate::chain::{Chain, ChainLink};
use crate::context::PayloadFactory;

// ── Routes ───────────────────────────────────────────────────────────────────

/// The filter-visible part of a registered route: its method and pattern.
#[derive(Clone, Debug)]
pub struct RouteInfo {
    method: Method,
    pattern: String,
}

impl RouteInfo {
    pub(crate) fn new(method: Method, pattern: String) -> Self {
        Self { method, pattern }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// A declared route before its chain is built.
pub struct RouteDescriptor {
    info: RouteInfo,
    endpoint: Chain,
    payload: Option<PayloadFactory>,
}

impl RouteDescriptor {
    pub fn info(&self) -> &RouteInfo {
        &self.info
    }

    pub(crate) fn endpoint(&self) -> &Chain {
        &self.endpoint
    }

    pub(crate) fn payload(&self) -> Option<&PayloadFactory> {
        self.payload.as_ref()
    }

    pub(crate) fn set_payload(&mut self, factory: PayloadFactory) {
        self.payload = Some(factory);
    }
}

/// Stores declared routes in insertion order.
///
/// Duplicate method+pattern pairs are kept; what a router makes of them is
/// the router's concern.
#[derive(Default)]
pub struct RouteRegistry {
    routes: Vec<RouteDescriptor>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route. The returned descriptor accepts a per-route payload
    /// override until the chains are built.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: impl Into<String>,
        endpoint: Chain,
    ) -> &mut RouteDescriptor {
        self.routes.push(RouteDescriptor {
            info: RouteInfo::new(method, pattern.into()),
            endpoint,
            payload: None,
        });
        let last = self.routes.len() - 1;
        &mut self.routes[last]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Static applicability predicate over a route. Pure and side-effect free;
/// evaluated once per route when the chains are built.
pub type RouteFilter = Box<dyn Fn(&RouteInfo) -> bool + Send + Sync>;

/// A registered middleware: its filter, its wrapping link, and an optional
/// payload-factory override.
pub struct MiddlewareEntry {
    filter: RouteFilter,
    link: ChainLink,
    payload: Option<PayloadFactory>,
}

impl MiddlewareEntry {
    pub fn applies_to(&self, route: &RouteInfo) -> bool {
        (self.filter)(route)
    }

    pub(crate) fn link(&self) -> &ChainLink {
        &self.link
    }

    pub(crate) fn payload(&self) -> Option<&PayloadFactory> {
        self.payload.as_ref()
    }

    pub(crate) fn set_payload(&mut self, factory: PayloadFactory) {
        self.payload = Some(factory);
    }
}

/// Stores middleware entries in registration order, each paired with its
/// static route filter.
#[derive(Default)]
pub struct MiddlewareRegistry {
    entries: Vec<MiddlewareEntry>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. The returned entry accepts a payload override until
    /// the chains are built.
    pub fn add(&mut self, filter: RouteFilter, link: ChainLink) -> &mut MiddlewareEntry {
        self.entries.push(MiddlewareEntry { filter, link, payload: None });
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Registers a link that applies to every route.
    pub fn add_for_all_routes(&mut self, link: ChainLink) -> &mut MiddlewareEntry {
        self.add(Box::new(|_| true), link)
    }

    /// Every entry whose filter passes `route`, in registration order.
    ///
    /// O(total middleware) per call; runs once per route at build time.
    pub fn applicable_to(&self, route: &RouteInfo) -> Vec<&MiddlewareEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.applies_to(route))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::chain_fn;
    use crate::context::Context;

    fn noop_link() -> ChainLink {
        Box::new(|inner| inner)
    }

    fn endpoint() -> Chain {
        chain_fn(|ctx: Context| async move { ctx })
    }

    #[test]
    fn all_routes_middleware_applies_everywhere() {
        let mut registry = MiddlewareRegistry::new();
        registry.add_for_all_routes(noop_link());

        for i in 0..5 {
            let info = RouteInfo::new(Method::GET, format!("/r{i}"));
            assert_eq!(registry.applicable_to(&info).len(), 1);
        }
    }

    #[test]
    fn filters_run_in_registration_order() {
        let mut registry = MiddlewareRegistry::new();
        registry.add(Box::new(|r| r.pattern().starts_with("/api")), noop_link());
        registry.add_for_all_routes(noop_link());
        registry.add(Box::new(|r| r.method() == Method::POST), noop_link());

        let get_api = RouteInfo::new(Method::GET, "/api/a".to_owned());
        assert_eq!(registry.applicable_to(&get_api).len(), 2);

        let post_root = RouteInfo::new(Method::POST, "/".to_owned());
        assert_eq!(registry.applicable_to(&post_root).len(), 2);
    }

    #[test]
    fn duplicate_routes_are_both_kept() {
        let mut registry = RouteRegistry::new();
        registry.add_route(Method::GET, "/dup", endpoint());
        registry.add_route(Method::GET, "/dup", endpoint());
        assert_eq!(registry.len(), 2);
    }
}
