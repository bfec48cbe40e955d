//! Incoming HTTP request type.

use std::collections::HashMap;

use http::Method;

/// An incoming HTTP request, decoupled from the wire transport.
///
/// The bundled server builds one per request from the hyper connection;
/// tests and external routers construct them directly with [`Request::new`]
/// and the `with_*` builder methods.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    params: HashMap<String, String>,
}

impl Request {
    /// Builds a request for `target`. Anything after the first `?` is kept
    /// as the raw query string.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (target.to_owned(), None),
        };
        Self {
            method,
            path,
            query,
            headers: Vec::new(),
            body: Vec::new(),
            params: HashMap::new(),
        }
    }

    pub(crate) fn from_parts(
        method: Method,
        path: String,
        query: Option<String>,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        params: HashMap<String, String>,
    ) -> Self {
        Self { method, path, query, headers, body, params }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Attaches a named argument as an external router would after matching
    /// a path segment.
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named argument extracted by the router from path segments.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// First query-string value named `name`, percent-decoded.
    pub fn query_value(&self, name: &str) -> Option<String> {
        decode_pairs(self.query.as_deref()?, name)
    }

    /// First form-body value named `name`. The body is only inspected when
    /// the request declares `application/x-www-form-urlencoded`.
    pub fn form_value(&self, name: &str) -> Option<String> {
        let content_type = self.header("content-type")?;
        if !content_type
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("application/x-www-form-urlencoded")
        {
            return None;
        }
        decode_pairs(std::str::from_utf8(&self.body).ok()?, name)
    }

    /// Value of the cookie `name` from the `cookie` header.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.header("cookie")?.split(';').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k.trim() == name).then(|| v.trim().to_owned())
        })
    }
}

/// Finds `name` in a `k=v&k=v` sequence and percent-decodes its value.
fn decode_pairs(pairs: &str, name: &str) -> Option<String> {
    pairs.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        if decode(k)? != name {
            return None;
        }
        decode(v)
    })
}

// `+` means space in the query/form encoding; `urlencoding` only handles `%xx`.
fn decode(s: &str) -> Option<String> {
    urlencoding::decode(&s.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::new(Method::GET, "/").with_header("Content-Type", "text/plain");
        assert_eq!(req.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn query_values_are_decoded() {
        let req = Request::new(Method::GET, "/greet?name=hello+world&x=%2Fetc");
        assert_eq!(req.query_value("name").as_deref(), Some("hello world"));
        assert_eq!(req.query_value("x").as_deref(), Some("/etc"));
        assert_eq!(req.query_value("missing"), None);
    }

    #[test]
    fn form_values_require_the_urlencoded_content_type() {
        let req = Request::new(Method::POST, "/")
            .with_header("content-type", "application/x-www-form-urlencoded; charset=utf-8")
            .with_body("name=foo&age=3");
        assert_eq!(req.form_value("name").as_deref(), Some("foo"));
        assert_eq!(req.form_value("age").as_deref(), Some("3"));

        let json = Request::new(Method::POST, "/")
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"foo"}"#);
        assert_eq!(json.form_value("name"), None);
    }

    #[test]
    fn cookies_parse_out_of_the_cookie_header() {
        let req = Request::new(Method::GET, "/").with_header("cookie", "a=1; name=foo; b=2");
        assert_eq!(req.cookie("name").as_deref(), Some("foo"));
        assert_eq!(req.cookie("missing"), None);
    }
}
