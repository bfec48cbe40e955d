//! Radix-tree router over built routes.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. The
//! router is deliberately dumb: it consumes the list `Composer::build`
//! produced and maps a matched path to its pre-composed chain. Any other
//! URL-matching transport can play this role — mount the same list with it
//! and call `Route::invoke` for matched requests.

use std::collections::HashMap;

use http::Method;
use matchit::Router as MatchitRouter;
use tracing::warn;

use crate::chain::Route;

/// The application router. Build it once at startup from the composer's
/// output; pass it to `Server::serve`.
pub struct Router {
    table: Vec<Route>,
    trees: HashMap<Method, MatchitRouter<usize>>,
}

impl Router {
    /// Mounts the build output.
    ///
    /// Patterns use matchit's `{name}` syntax; extracted segments surface as
    /// `Request::param` values, and from there through the binder's
    /// named-argument source. Duplicate method+pattern pairs keep the first
    /// mount and log a warning for the rest.
    ///
    /// # Panics
    ///
    /// Panics if a pattern is not a valid matchit route — a configuration
    /// error, surfaced before any traffic is served.
    pub fn mount(routes: Vec<Route>) -> Self {
        let mut trees: HashMap<Method, MatchitRouter<usize>> = HashMap::new();
        for (index, route) in routes.iter().enumerate() {
            let tree = trees.entry(route.method().clone()).or_default();
            match tree.insert(route.pattern(), index) {
                Ok(()) => {}
                Err(matchit::InsertError::Conflict { .. }) => {
                    warn!(
                        method = %route.method(),
                        pattern = route.pattern(),
                        "duplicate route, keeping the first"
                    );
                }
                Err(e) => panic!("invalid route `{}`: {e}", route.pattern()),
            }
        }
        Self { table: routes, trees }
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(&Route, HashMap<String, String>)> {
        let tree = self.trees.get(method)?;
        let matched = tree.at(path).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((&self.table[*matched.value], params))
    }
}
