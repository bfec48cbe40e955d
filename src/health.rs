//! Built-in Kubernetes health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Register them like any route:
//!
//! ```rust
//! use allium::{health, Composer};
//!
//! let mut app = Composer::new();
//! app.get("/healthz", health::liveness);
//! app.get("/readyz", health::readiness);
//! ```
//!
//! Replace `readiness` with your own handler if the pod must gate on
//! dependency availability before accepting traffic.

use crate::context::Context;

/// Liveness probe handler.
///
/// Always `200 OK` with body `"ok"` — if the process can respond to HTTP at
/// all, it is alive, so this handler intentionally has no dependencies.
pub async fn liveness(mut ctx: Context) -> Context {
    ctx.write("ok");
    ctx
}

/// Readiness probe handler (default implementation).
///
/// `200 OK` with body `"ready"`.
pub async fn readiness(mut ctx: Context) -> Context {
    ctx.write("ready");
    ctx
}
