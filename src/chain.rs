//! Chain composition: the onion fold and the built route.
//!
//! # How a chain is stored
//!
//! A composed pipeline is a single [`Chain`] — middleware layers wrapped
//! around a terminal handler, built once per route at startup. Layers of
//! *different* concrete types have to live behind one interface, so the same
//! type-erasure shape is used throughout: a `dyn` trait behind an `Arc`,
//! with [`chain_fn`] bridging from a plain async closure.
//!
//! ```text
//! |ctx| async move { … }            ← a layer or terminal handler
//!        ↓ chain_fn(f)
//! Arc::new(FnChain(f))              ← heap-allocated, shared across requests
//!        ↓ stored as Chain = Arc<dyn ChainHandler>
//! chain.call(ctx)  at request time  ← one vtable dispatch per layer
//! ```
//!
//! The context is threaded by value: each layer receives it, may write
//! through it, substitute its sink or request, decide not to descend at all,
//! and hands it back when it is done. Composition happens exactly once —
//! invoking a built [`Route`] never re-walks any registry.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;

use crate::binder::Binder;
use crate::context::{Context, PayloadFactory};
use crate::registry::MiddlewareEntry;
use crate::request::Request;
use crate::response::{Response, ResponseBuffer, ResponseSink};

// ── Chain types ──────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves back to the [`Context`].
pub type BoxFuture = Pin<Box<dyn Future<Output = Context> + Send + 'static>>;

/// One layer of a composed pipeline.
///
/// The context flows in; the (possibly rewritten) context flows back out once
/// the layer — and whatever part of the pipeline it chose to run — is done.
pub trait ChainHandler: Send + Sync {
    fn call(&self, ctx: Context) -> BoxFuture;
}

/// A shared, type-erased pipeline layer.
pub type Chain = Arc<dyn ChainHandler>;

/// A middleware's wrapping transformation: given the rest of the pipeline,
/// produce the handler that wraps it. The only extensibility point of the
/// composition engine.
pub type ChainLink = Box<dyn Fn(Chain) -> Chain + Send + Sync>;

/// Newtype wrapper bridging a concrete async closure to the trait-object world.
struct FnChain<F>(F);

impl<F, Fut> ChainHandler for FnChain<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Context> + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture {
        Box::pin((self.0)(ctx))
    }
}

/// Erases an async closure into a [`Chain`].
pub fn chain_fn<F, Fut>(f: F) -> Chain
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Context> + Send + 'static,
{
    Arc::new(FnChain(f))
}

/// Adapts a plain handler into a link that runs it, then the rest of the
/// pipeline. The non-wrapping way to register middleware.
pub fn before<F, Fut>(f: F) -> impl Fn(Chain) -> Chain + Send + Sync + 'static
where
    F: Fn(Context) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Context> + Send + 'static,
{
    move |inner: Chain| {
        let f = f.clone();
        chain_fn(move |ctx| {
            let inner = Arc::clone(&inner);
            let f = f.clone();
            async move { inner.call(f(ctx).await).await }
        })
    }
}

// ── Composition ──────────────────────────────────────────────────────────────

/// Folds the applicable middleware over the terminal handler, last entry
/// innermost, so the outermost layer belongs to the first registration.
pub(crate) fn compose(endpoint: Chain, entries: &[&MiddlewareEntry]) -> Chain {
    entries
        .iter()
        .rev()
        .fold(endpoint, |chain, entry| entry.link()(chain))
}

// ── Route ────────────────────────────────────────────────────────────────────

/// A built route: the composed chain plus everything its root shell needs to
/// stand up one fresh [`Context`] per request.
///
/// Produced by `Composer::build`, read-only thereafter. Hand the whole list
/// to `Router::mount`, or register method + pattern with any URL-matching
/// transport and call [`invoke`](Route::invoke) for matched requests.
pub struct Route {
    method: Method,
    pattern: String,
    chain: Chain,
    payload: Option<PayloadFactory>,
    binder: Arc<Binder>,
}

impl Route {
    pub(crate) fn new(
        method: Method,
        pattern: String,
        chain: Chain,
        payload: Option<PayloadFactory>,
        binder: Arc<Binder>,
    ) -> Self {
        Self { method, pattern, chain, payload, binder }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Runs the composed chain once against `sink`.
    ///
    /// A fresh context is created for this invocation and the winning payload
    /// factory, if any, runs exactly once before the outermost layer. The
    /// sink stack comes back when the chain has unwound; drain it with
    /// [`ResponseSink::finish`].
    pub async fn invoke(
        &self,
        sink: Box<dyn ResponseSink>,
        request: Request,
    ) -> Box<dyn ResponseSink> {
        let mut ctx = Context::with_binder(sink, request, Arc::clone(&self.binder));
        if let Some(factory) = &self.payload {
            ctx.set_payload(factory());
        }
        self.chain.call(ctx).await.into_sink()
    }

    /// Invokes against a fresh [`ResponseBuffer`] and finishes it.
    pub async fn respond(&self, request: Request) -> Response {
        self.invoke(Box::new(ResponseBuffer::new()), request)
            .await
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn terminal(mut ctx: Context) -> Context {
        ctx.write("H");
        ctx
    }

    #[tokio::test]
    async fn empty_middleware_list_degenerates_to_the_terminal_handler() {
        let route = Route::new(
            Method::GET,
            "/".to_owned(),
            chain_fn(terminal),
            None,
            Arc::new(Binder::new()),
        );
        let response = route.respond(Request::new(Method::GET, "/")).await;
        assert_eq!(response.body(), b"H");
        assert_eq!(response.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn before_runs_its_handler_and_then_descends() {
        let link = before(|mut ctx: Context| async move {
            ctx.write("pre-");
            ctx
        });
        let chain = link(chain_fn(terminal));
        let ctx = Context::new(
            Box::new(ResponseBuffer::new()),
            Request::new(Method::GET, "/"),
        );
        let response = chain.call(ctx).await.finish();
        assert_eq!(response.body(), b"pre-H");
    }
}
