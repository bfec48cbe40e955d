//! Per-request tracing link.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::chain::{chain_fn, Chain};
use crate::context::Context;

/// Logs one line per request: method, path, response status, latency.
///
/// Register it outermost (after a recovery link, if any) so the latency
/// covers the whole chain.
pub fn trace() -> impl Fn(Chain) -> Chain + Send + Sync + 'static {
    |inner: Chain| {
        chain_fn(move |ctx: Context| {
            let inner = Arc::clone(&inner);
            async move {
                let method = ctx.request().method().clone();
                let path = ctx.request().path().to_owned();
                let start = Instant::now();

                let ctx = inner.call(ctx).await;

                info!(
                    %method,
                    path,
                    status = ctx.status().as_u16(),
                    elapsed = ?start.elapsed(),
                    "request"
                );
                ctx
            }
        })
    }
}
