//! Built-in chain links.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: panic recovery, structured tracing, header
//! injection, and authentication checks. Everything here is a plain chain
//! link — register it with `Composer::wrap` like any middleware of your own,
//! at whatever position fits.

pub mod recovery;
pub mod trace;

pub use recovery::{recovery, recovery_verbose};
pub use trace::trace;
