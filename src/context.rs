//! Per-request context threaded through a composed chain.

use std::any::Any;
use std::sync::Arc;

use http::StatusCode;

use crate::binder::Binder;
use crate::request::Request;
use crate::response::{Response, ResponseBuffer, ResponseSink};

/// Builds the per-request user payload. The winning factory for a route is
/// resolved once when the chains are built; it runs once per request, before
/// the outermost middleware layer.
pub type PayloadFactory = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Everything one request invocation carries through the chain: the current
/// response sink, the current request, and the optional user payload.
///
/// A fresh context is created for every invocation of a composed handler and
/// destroyed when the request completes; it is never shared across requests.
/// The sink and request live in mutable slots — a middleware layer that
/// substitutes either is observed by every layer below it.
pub struct Context {
    sink: Box<dyn ResponseSink>,
    request: Request,
    payload: Option<Box<dyn Any + Send>>,
    binder: Arc<Binder>,
}

impl Context {
    pub fn new(sink: Box<dyn ResponseSink>, request: Request) -> Self {
        Self::with_binder(sink, request, Arc::new(Binder::new()))
    }

    pub(crate) fn with_binder(
        sink: Box<dyn ResponseSink>,
        request: Request,
        binder: Arc<Binder>,
    ) -> Self {
        Self { sink, request, payload: None, binder }
    }

    // ── Request slot ─────────────────────────────────────────────────────────

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Replaces the request seen by the rest of the chain.
    pub fn set_request(&mut self, request: Request) {
        self.request = request;
    }

    // ── Sink slot ────────────────────────────────────────────────────────────

    pub fn sink(&mut self) -> &mut dyn ResponseSink {
        &mut *self.sink
    }

    /// Substitutes the response sink. `wrap` receives the current sink and
    /// returns the wrapper that takes its place; every downstream layer and
    /// the terminal handler write through the wrapper for the remainder of
    /// the request.
    pub fn wrap_sink(
        &mut self,
        wrap: impl FnOnce(Box<dyn ResponseSink>) -> Box<dyn ResponseSink>,
    ) {
        // Park an empty buffer in the slot while the wrapper takes ownership.
        let inner = std::mem::replace(&mut self.sink, Box::new(ResponseBuffer::new()));
        self.sink = wrap(inner);
    }

    /// Appends a body chunk through the current sink.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        self.sink.write(chunk.as_ref());
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.sink.set_status(status);
    }

    pub fn status(&self) -> StatusCode {
        self.sink.status()
    }

    pub fn insert_header(&mut self, name: &str, value: &str) {
        self.sink.insert_header(name, value);
    }

    // ── Payload ──────────────────────────────────────────────────────────────

    /// The user payload, if the route resolved a factory and it produced a `T`.
    pub fn payload<T: Send + 'static>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref()
    }

    pub fn payload_mut<T: Send + 'static>(&mut self) -> Option<&mut T> {
        self.payload.as_mut()?.downcast_mut()
    }

    pub(crate) fn set_payload(&mut self, payload: Box<dyn Any + Send>) {
        self.payload = Some(payload);
    }

    // ── Binding ──────────────────────────────────────────────────────────────

    /// The binder dynamically-bound handlers resolve their parameters with.
    pub fn binder(&self) -> &Arc<Binder> {
        &self.binder
    }

    // ── Teardown ─────────────────────────────────────────────────────────────

    /// Tears the context down into the finished response.
    pub fn finish(self) -> Response {
        self.sink.finish()
    }

    pub(crate) fn into_sink(self) -> Box<dyn ResponseSink> {
        self.sink
    }
}
