//! Terminal handler shapes.
//!
//! # Accepted shapes
//!
//! Handlers conform to one of a small, enumerated set of shapes, each handled
//! by a dedicated adapter — there is no open-ended signature inspection:
//!
//! - the **canonical shape** `async fn(ctx: Context) -> Context`, satisfied
//!   automatically via the [`Handler`] blanket impl. It owns the sink and
//!   request through the context and never touches the argument binder;
//! - [`bound`] — a declared parameter list resolved through the binder's
//!   ordered sources at invocation time;
//! - [`with_text`] — fast path for the single-text-parameter shape;
//! - [`nullary`] — fast path for handlers taking no parameters at all.
//!
//! The fast paths are an optimization, not a semantic difference: for
//! equivalent signatures every path produces identical observable behavior.

use std::future::Future;
use std::sync::Arc;

use crate::binder::{BoundArg, ParamSpec};
use crate::chain::{chain_fn, Chain};
use crate::context::Context;

/// Implemented for every valid terminal handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the canonical signature:
///
/// ```text
/// async fn name(ctx: Context) -> Context
/// ```
///
/// and for the values returned by the [`bound`], [`with_text`], and
/// [`nullary`] adapters. The trait is **sealed** (via the private `Sealed`
/// supertrait): only the blanket impl below can satisfy it, so an
/// unsupported handler shape is rejected at compile time rather than at
/// request time.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_chain(self) -> Chain;
}

/// The sealing module. Because `Sealed` is private, external crates cannot
/// name it and therefore cannot implement `Handler` on their own types.
mod private {
    pub trait Sealed {}
}

impl<F, Fut> private::Sealed for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Context> + Send + 'static,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Context> + Send + 'static,
{
    fn into_chain(self) -> Chain {
        chain_fn(self)
    }
}

// ── Dynamically bound shapes ─────────────────────────────────────────────────

/// The general dynamic shape: each declared parameter is resolved through the
/// binder's ordered sources when a request comes in, and the handler receives
/// the arguments in declaration order.
///
/// # Panics
///
/// Invocation panics if any parameter cannot be resolved or converted —
/// a mismatched handler signature is caught on the first request that hits
/// it, never silently defaulted. Install `middleware::recovery` to turn the
/// panic into a `500`.
pub fn bound<F, Fut>(params: Vec<ParamSpec>, f: F) -> impl Handler
where
    F: Fn(Context, Vec<BoundArg>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Context> + Send + 'static,
{
    let f = Arc::new(f);
    let params = Arc::new(params);
    move |ctx: Context| {
        let f = Arc::clone(&f);
        let params = Arc::clone(&params);
        async move {
            let args = match ctx.binder().bind_all(ctx.request(), &params) {
                Ok(args) => args,
                Err(e) => panic!("{e}"),
            };
            f(ctx, args).await
        }
    }
}

/// Fast path for the single-text-parameter shape. Behaviorally identical to
/// `bound(vec![ParamSpec::text(name)], …)`.
///
/// # Panics
///
/// Invocation panics if the parameter cannot be resolved, exactly as
/// [`bound`] does.
pub fn with_text<F, Fut>(name: impl Into<String>, f: F) -> impl Handler
where
    F: Fn(Context, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Context> + Send + 'static,
{
    let param = ParamSpec::text(name);
    let f = Arc::new(f);
    move |ctx: Context| {
        let f = Arc::clone(&f);
        let param = param.clone();
        async move {
            let value = match ctx.binder().bind(ctx.request(), &param) {
                Ok(BoundArg::Text(value)) => value,
                Ok(_) => panic!("parameter `{}` bound as a non-text value", param.name()),
                Err(e) => panic!("{e}"),
            };
            f(ctx, value).await
        }
    }
}

/// Fast path for handlers that take no parameters at all. The handler runs
/// for its side effects; anything written to the response comes from other
/// layers of the chain.
pub fn nullary<F, Fut>(f: F) -> impl Handler
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    move |ctx: Context| {
        let fut = f();
        async move {
            fut.await;
            ctx
        }
    }
}
