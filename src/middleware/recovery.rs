//! Panic recovery links.
//!
//! Neither link is installed by default: without one, a handler panic
//! propagates to the host task and the transport surfaces the failure
//! however it surfaces failed tasks. Registered outermost, a recovery link
//! sees every downstream termination — including binding failures, which
//! surface as panics.

use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use http::StatusCode;
use tracing::error;

use crate::chain::{chain_fn, Chain};
use crate::context::Context;
use crate::response::ResponseBuffer;

/// Converts any downstream panic into a bare `500 Internal Server Error`.
pub fn recovery() -> impl Fn(Chain) -> Chain + Send + Sync + 'static {
    recover_with(false)
}

/// Development variant: renders the panic message and a captured backtrace
/// as plain text. Do not expose in production.
pub fn recovery_verbose() -> impl Fn(Chain) -> Chain + Send + Sync + 'static {
    recover_with(true)
}

fn recover_with(verbose: bool) -> impl Fn(Chain) -> Chain + Send + Sync + 'static {
    move |inner: Chain| {
        chain_fn(move |ctx: Context| {
            let inner = Arc::clone(&inner);
            async move {
                // The in-flight context is lost with a panicked future; keep
                // enough of it to stand up the error response in its place.
                let request = ctx.request().clone();
                let binder = Arc::clone(ctx.binder());

                match AssertUnwindSafe(inner.call(ctx)).catch_unwind().await {
                    Ok(ctx) => ctx,
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        error!(path = request.path(), panic = %message, "handler panicked");

                        let mut ctx = Context::with_binder(
                            Box::new(ResponseBuffer::new()),
                            request,
                            binder,
                        );
                        ctx.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                        ctx.insert_header("content-type", "text/plain; charset=utf-8");
                        if verbose {
                            let backtrace = Backtrace::force_capture();
                            ctx.write(format!("panic: {message}\n\n{backtrace}"));
                        } else {
                            ctx.write("Internal Server Error");
                        }
                        ctx
                    }
                }
            }
        })
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
