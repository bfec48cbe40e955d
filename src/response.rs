//! Response sink trait, the buffered sink, and the finished response.
//!
//! Handlers and middleware never build a response value directly; they write
//! through the [`ResponseSink`] carried by the request context. A middleware
//! layer may substitute the sink with its own wrapper, and every layer below
//! it then writes through the wrapper — see `Context::wrap_sink`.
//! [`ResponseBuffer`] is the standard sink at the bottom of any wrapper
//! stack; [`ResponseSink::finish`] tears the stack down into the final
//! [`Response`].

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use tracing::error;

// ── ResponseSink ─────────────────────────────────────────────────────────────

/// The write side of a response, threaded through a composed chain.
///
/// Wrapping sinks own the sink they wrap and forward every method to it,
/// transforming whatever they care about on the way through.
pub trait ResponseSink: Send {
    /// Appends a body chunk.
    fn write(&mut self, chunk: &[u8]);

    fn set_status(&mut self, status: StatusCode);

    fn status(&self) -> StatusCode;

    /// Appends a header.
    fn insert_header(&mut self, name: &str, value: &str);

    /// Consumes the sink stack and yields the finished response.
    fn finish(self: Box<Self>) -> Response;
}

// ── ResponseBuffer ───────────────────────────────────────────────────────────

/// The standard sink: buffers status, headers, and body in memory.
///
/// Starts out as `200 OK` with no headers and an empty body.
pub struct ResponseBuffer {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self { Self::new() }
}

impl ResponseSink for ResponseBuffer {
    fn write(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn insert_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    fn finish(self: Box<Self>) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// A finished HTTP response, read-only.
///
/// Produced by draining a sink stack once the chain has unwound. The bundled
/// server converts it into the hyper representation with
/// [`into_http`](Response::into_http).
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    pub(crate) fn status_only(status: StatusCode) -> Self {
        Self { status, headers: Vec::new(), body: Vec::new() }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Converts into the wire representation served by hyper.
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        match builder.body(Full::new(Bytes::from(self.body))) {
            Ok(response) => response,
            Err(e) => {
                // A handler wrote a malformed header name or value.
                error!("invalid response: {e}");
                let mut fallback = http::Response::new(Full::new(Bytes::new()));
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_collects_writes_in_order() {
        let mut sink: Box<dyn ResponseSink> = Box::new(ResponseBuffer::new());
        sink.write(b"hello, ");
        sink.write(b"world");
        sink.set_status(StatusCode::CREATED);
        sink.insert_header("x-test", "1");

        let response = sink.finish();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body(), b"hello, world");
        assert_eq!(response.headers(), &[("x-test".to_owned(), "1".to_owned())]);
    }
}
